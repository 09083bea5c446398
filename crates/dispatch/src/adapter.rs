//! The transport adapter seam (§4.B: "instantiate the matching transport
//! adapter"). The vendor SDK integration behind each adapter is explicitly
//! out of scope; these are thin `reqwest`-based webhook posters in the
//! style of `notify::channels`.

use async_trait::async_trait;
use ticket_store::ChannelType;

use crate::error::ChannelError;
use crate::event::DispatchEvent;

#[async_trait]
pub trait TransportAdapter: Send + Sync {
    fn kind(&self) -> ChannelType;

    async fn send(&self, event: &DispatchEvent) -> Result<(), ChannelError>;
}
