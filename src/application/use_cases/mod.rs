pub mod reconciler;
pub mod subscription;
