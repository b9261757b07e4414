use {
    crate::memory::AllocatorError,
    ash::vk,
    std::{ffi::c_void, sync::Arc},
};

/// The driver calls used by the memory manager to get and release the large
/// blocks of device memory which back each pool.
pub trait MemoryDevice {
    /// Allocate a block of device memory.
    ///
    /// # Safety
    ///
    /// Unsafe because the caller is responsible for calling free_memory when
    /// the memory is no longer needed.
    unsafe fn allocate_memory(
        &self,
        allocate_info: &vk::MemoryAllocateInfo,
    ) -> Result<vk::DeviceMemory, AllocatorError>;

    /// Free a block of device memory.
    ///
    /// # Safety
    ///
    /// Unsafe because the caller must ensure that no GPU operations refer to
    /// the memory and that it is no longer mapped.
    unsafe fn free_memory(&self, device_memory: vk::DeviceMemory);

    /// Map the entire block of device memory into host address space.
    ///
    /// # Safety
    ///
    /// Unsafe because only memory from a HOST_VISIBLE memory type can be
    /// mapped, and memory can only be mapped once at a time.
    unsafe fn map_memory(
        &self,
        device_memory: vk::DeviceMemory,
        size_in_bytes: vk::DeviceSize,
    ) -> Result<*mut c_void, AllocatorError>;

    /// Unmap a previously mapped block of device memory.
    ///
    /// # Safety
    ///
    /// Unsafe because the application must ensure the mapped pointer is no
    /// longer used.
    unsafe fn unmap_memory(&self, device_memory: vk::DeviceMemory);
}

impl MemoryDevice for ash::Device {
    unsafe fn allocate_memory(
        &self,
        allocate_info: &vk::MemoryAllocateInfo,
    ) -> Result<vk::DeviceMemory, AllocatorError> {
        // Memory returned by the device always meets the alignment
        // requirements of any resource which can be bound to it.
        ash::Device::allocate_memory(self, allocate_info, None)
            .map_err(AllocatorError::UnableToAllocateDeviceMemory)
    }

    unsafe fn free_memory(&self, device_memory: vk::DeviceMemory) {
        ash::Device::free_memory(self, device_memory, None)
    }

    unsafe fn map_memory(
        &self,
        device_memory: vk::DeviceMemory,
        size_in_bytes: vk::DeviceSize,
    ) -> Result<*mut c_void, AllocatorError> {
        ash::Device::map_memory(
            self,
            device_memory,
            0,
            size_in_bytes,
            vk::MemoryMapFlags::empty(),
        )
        .map_err(AllocatorError::UnableToMapDeviceMemory)
    }

    unsafe fn unmap_memory(&self, device_memory: vk::DeviceMemory) {
        ash::Device::unmap_memory(self, device_memory)
    }
}

impl<D: MemoryDevice> MemoryDevice for Arc<D> {
    unsafe fn allocate_memory(
        &self,
        allocate_info: &vk::MemoryAllocateInfo,
    ) -> Result<vk::DeviceMemory, AllocatorError> {
        self.as_ref().allocate_memory(allocate_info)
    }

    unsafe fn free_memory(&self, device_memory: vk::DeviceMemory) {
        self.as_ref().free_memory(device_memory)
    }

    unsafe fn map_memory(
        &self,
        device_memory: vk::DeviceMemory,
        size_in_bytes: vk::DeviceSize,
    ) -> Result<*mut c_void, AllocatorError> {
        self.as_ref().map_memory(device_memory, size_in_bytes)
    }

    unsafe fn unmap_memory(&self, device_memory: vk::DeviceMemory) {
        self.as_ref().unmap_memory(device_memory)
    }
}
