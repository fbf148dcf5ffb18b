pub mod processor_event;
pub mod subscription_record;
