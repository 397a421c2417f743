use candle::{
    utils::{cuda_is_available, metal_is_available},
    Device,
};
use tracing::info;

pub mod t5;

/// Picks the best device available for inference, falling back to the CPU.
pub fn device(device_id: usize) -> Result<Device, candle::Error> {
    if cuda_is_available() {
        info!("running inference on CUDA device {device_id}");
        Device::new_cuda(device_id)
    } else if metal_is_available() {
        info!("running inference on Metal device {device_id}");
        Device::new_metal(device_id)
    } else {
        info!("no accelerator available, running inference on the CPU");
        Ok(Device::Cpu)
    }
}
