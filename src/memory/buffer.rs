use {
    crate::memory::{Allocation, AllocatorError, MemoryManager},
    ash::vk,
};

/// A Vulkan buffer bound to memory from a [MemoryManager].
#[derive(Debug)]
pub struct Buffer {
    pub raw: vk::Buffer,
    pub allocation: Allocation,
}

impl MemoryManager<ash::Device> {
    /// Create a Vulkan buffer and bind it to newly allocated memory.
    ///
    /// # Safety
    ///
    /// Unsafe because the buffer must be destroyed with [Self::destroy_buffer]
    /// before the manager is destroyed.
    pub unsafe fn create_buffer(
        &mut self,
        buffer_usage_flags: vk::BufferUsageFlags,
        memory_property_flags: vk::MemoryPropertyFlags,
        size_in_bytes: vk::DeviceSize,
    ) -> Result<Buffer, AllocatorError> {
        let create_info = vk::BufferCreateInfo {
            size: size_in_bytes,
            usage: buffer_usage_flags,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        };
        let raw = self
            .device()
            .create_buffer(&create_info, None)
            .map_err(|err| AllocatorError::UnableToCreateBuffer {
                size: size_in_bytes,
                usage: buffer_usage_flags,
                source: err,
            })?;

        let memory_requirements =
            self.device().get_buffer_memory_requirements(raw);
        let allocation = match self
            .allocate_memory(memory_requirements, memory_property_flags)
        {
            Ok(allocation) => allocation,
            Err(err) => {
                self.device().destroy_buffer(raw, None);
                return Err(err);
            }
        };

        let bind_result = self.device().bind_buffer_memory(
            raw,
            allocation.device_memory(),
            allocation.offset_in_bytes(),
        );
        if let Err(err) = bind_result {
            self.device().destroy_buffer(raw, None);
            self.free(&allocation)?;
            return Err(AllocatorError::UnableToBindBufferMemory(err));
        }

        Ok(Buffer { raw, allocation })
    }

    /// Destroy a buffer and return its memory to the manager.
    ///
    /// # Safety
    ///
    /// Unsafe because the GPU must no longer be using the buffer.
    pub unsafe fn destroy_buffer(
        &mut self,
        buffer: &mut Buffer,
    ) -> Result<(), AllocatorError> {
        if buffer.raw != vk::Buffer::null() {
            self.device().destroy_buffer(buffer.raw, None);
            buffer.raw = vk::Buffer::null();
        }
        if !buffer.allocation.is_null() {
            self.free(&buffer.allocation)?;
            buffer.allocation = Allocation::null();
        }
        Ok(())
    }
}
