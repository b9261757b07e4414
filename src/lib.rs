//! A binary buddy sub-allocator for Vulkan device memory.
//!
//! The [memory::MemoryManager] requests large pools of device memory and
//! hands out power-of-two ranges from them, so a renderer only needs a few
//! driver allocations no matter how many buffers and images it creates.

pub mod logging;
pub mod memory;
