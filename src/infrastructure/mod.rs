pub mod json_store;
pub mod memory;
pub mod shutdown;
pub mod sms_log;
pub mod twilio_relay;
