//! GPU memory management for the renderer.
//!
//! Device memory is requested from the driver in large fixed-size pools. Each
//! pool is carved into power-of-two chunks by a binary tree so that many small
//! resources can share a handful of driver allocations.

mod allocation;
mod buffer;
mod chunk;
mod device;
mod locked_memory_manager;
mod memory_manager;
mod memory_properties;
mod pool;

#[cfg(test)]
mod fake_device;

use {ash::vk, thiserror::Error};

pub use self::{
    allocation::Allocation,
    buffer::Buffer,
    device::MemoryDevice,
    locked_memory_manager::LockedMemoryManager,
    memory_manager::{
        MemoryManager, MemoryManagerConfig, DEFAULT_MIN_PAGE_SIZE,
        DEFAULT_POOL_ALLOCATION_SIZE,
    },
    memory_properties::MemoryProperties,
    pool::Pool,
};

#[derive(Debug, Error)]
pub enum AllocatorError {
    #[error(
        "Invalid pool configuration: allocation size {} and page size {} \
         must be powers of two with page size <= allocation size",
        .allocation_size,
        .min_page_size
    )]
    InvalidPoolConfiguration {
        allocation_size: vk::DeviceSize,
        min_page_size: vk::DeviceSize,
    },

    #[error(
        "No memory type could be found for flags {:?} and requirements {:?}",
        .0,
        .1
    )]
    MemoryTypeNotFound(vk::MemoryPropertyFlags, vk::MemoryRequirements),

    #[error(
        "Requested {} bytes but pools are only {} bytes",
        .requested,
        .allocation_size
    )]
    AllocationTooLarge {
        requested: vk::DeviceSize,
        allocation_size: vk::DeviceSize,
    },

    #[error("Unable to allocate device memory")]
    UnableToAllocateDeviceMemory(#[source] vk::Result),

    #[error("Unable to map device memory")]
    UnableToMapDeviceMemory(#[source] vk::Result),

    #[error(
        "No chunk owns the range at offset {} with size {}, the chunk tree \
         is corrupt or the allocation belongs to another allocator",
        .offset,
        .size
    )]
    CorruptChunkTree {
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    },

    #[error("The memory manager lock was poisoned by a panicking thread")]
    ManagerLockPoisoned,

    #[error(
        "Unable to create a new device buffer for {} bytes with flags {:?}",
        .size,
        .usage
    )]
    UnableToCreateBuffer {
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        source: vk::Result,
    },

    #[error("Unable to bind device memory to buffer")]
    UnableToBindBufferMemory(#[source] vk::Result),

    #[error("Device memory is not mapped")]
    DeviceMemoryIsNotMapped,

    #[error("Mapped device memory is not aligned for type {}", .0)]
    DeviceMemoryIsNotAlignedForType(String),
}
