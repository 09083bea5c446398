//! Thin per-channel transport adapters.

pub mod email;
pub mod feishu;
pub mod slack;
pub mod sms;

pub use email::EmailAdapter;
pub use feishu::FeishuAdapter;
pub use slack::SlackAdapter;
pub use sms::SmsAdapter;
