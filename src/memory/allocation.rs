use {
    crate::memory::AllocatorError,
    ash::vk,
    std::ffi::c_void,
};

/// A range of device memory reserved by the [crate::memory::MemoryManager].
///
/// The allocation does not own its memory. It must be returned to the manager
/// which created it and it must not outlive that manager.
#[derive(Debug, PartialEq, Eq)]
pub struct Allocation {
    device_memory: vk::DeviceMemory,
    memory_type_index: u32,
    offset_in_bytes: vk::DeviceSize,
    size_in_bytes: vk::DeviceSize,
    requested_size_in_bytes: vk::DeviceSize,
    cpu_mapped_ptr: Option<*mut c_void>,
}

// The mapped pointer refers to a persistently mapped pool which lives until
// the manager is destroyed, so it's valid on any thread.
unsafe impl Send for Allocation {}

// public api
impl Allocation {
    /// An empty allocation which doesn't reference any device memory.
    pub fn null() -> Self {
        Self {
            device_memory: vk::DeviceMemory::null(),
            memory_type_index: 0,
            offset_in_bytes: 0,
            size_in_bytes: 0,
            requested_size_in_bytes: 0,
            cpu_mapped_ptr: None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.device_memory == vk::DeviceMemory::null()
    }

    /// The underlying device memory shared by every allocation in the pool.
    pub fn device_memory(&self) -> vk::DeviceMemory {
        self.device_memory
    }

    pub fn memory_type_index(&self) -> u32 {
        self.memory_type_index
    }

    /// Offset from the start of the device memory. Use this when binding
    /// buffers and images.
    pub fn offset_in_bytes(&self) -> vk::DeviceSize {
        self.offset_in_bytes
    }

    /// The number of bytes actually reserved. Always a power of two and
    /// at least as large as the requested size.
    pub fn size_in_bytes(&self) -> vk::DeviceSize {
        self.size_in_bytes
    }

    /// The number of bytes originally requested.
    pub fn requested_size_in_bytes(&self) -> vk::DeviceSize {
        self.requested_size_in_bytes
    }

    /// True when the allocation came from host-visible memory.
    pub fn is_mappable(&self) -> bool {
        self.cpu_mapped_ptr.is_some()
    }

    /// A host pointer to the start of this allocation, if the memory is
    /// host-visible.
    pub fn mapped_ptr(&self) -> Option<*mut c_void> {
        self.cpu_mapped_ptr
    }

    /// Access the mapped memory as a slice of T.
    ///
    /// The slice covers the requested size, not the padded size.
    ///
    /// # Safety
    ///
    /// Unsafe because:
    ///  - the caller must synchronize with any GPU operations which access
    ///    the memory
    ///  - memory which is not HOST_COHERENT must be flushed after writes
    pub unsafe fn as_slice<T>(&self) -> Result<&[T], AllocatorError> {
        let ptr = self.typed_ptr::<T>()?;
        Ok(std::slice::from_raw_parts(
            ptr as *const T,
            self.element_count::<T>(),
        ))
    }

    /// Access the mapped memory as a mutable slice of T.
    ///
    /// # Safety
    ///
    /// See [Self::as_slice].
    pub unsafe fn as_slice_mut<T>(
        &mut self,
    ) -> Result<&mut [T], AllocatorError> {
        let ptr = self.typed_ptr::<T>()?;
        Ok(std::slice::from_raw_parts_mut(ptr, self.element_count::<T>()))
    }
}

// internal api
impl Allocation {
    pub(super) fn new(
        device_memory: vk::DeviceMemory,
        memory_type_index: u32,
        offset_in_bytes: vk::DeviceSize,
        size_in_bytes: vk::DeviceSize,
        requested_size_in_bytes: vk::DeviceSize,
        cpu_mapped_ptr: Option<*mut c_void>,
    ) -> Self {
        Self {
            device_memory,
            memory_type_index,
            offset_in_bytes,
            size_in_bytes,
            requested_size_in_bytes,
            cpu_mapped_ptr,
        }
    }

    fn typed_ptr<T>(&self) -> Result<*mut T, AllocatorError> {
        let mapped_ptr = self
            .cpu_mapped_ptr
            .ok_or(AllocatorError::DeviceMemoryIsNotMapped)?;

        if (mapped_ptr as usize % std::mem::align_of::<T>()) != 0 {
            return Err(AllocatorError::DeviceMemoryIsNotAlignedForType(
                std::any::type_name::<T>().to_owned(),
            ));
        }

        Ok(mapped_ptr as *mut T)
    }

    fn element_count<T>(&self) -> usize {
        match std::mem::size_of::<T>() {
            0 => 0,
            size => self.requested_size_in_bytes as usize / size,
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, ash::vk::Handle};

    #[test]
    fn null_allocations_are_not_mappable() {
        let allocation = Allocation::null();

        assert!(allocation.is_null());
        assert!(!allocation.is_mappable());
        assert!(matches!(
            unsafe { allocation.as_slice::<u32>() },
            Err(AllocatorError::DeviceMemoryIsNotMapped)
        ));
    }

    #[test]
    fn slices_cover_the_requested_size() {
        let mut backing = vec![0u32; 64];
        let mut allocation = Allocation::new(
            vk::DeviceMemory::from_raw(1),
            0,
            0,
            256,
            10 * 4,
            Some(backing.as_mut_ptr() as *mut c_void),
        );

        unsafe {
            allocation.as_slice_mut::<u32>().unwrap().fill(7);
            assert_eq!(allocation.as_slice::<u32>().unwrap().len(), 10);
        }
        assert_eq!(&backing[..11], &[7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 0]);
    }

    #[test]
    fn misaligned_pointers_are_rejected() {
        let mut backing = vec![0u64; 4];
        let misaligned = unsafe { (backing.as_mut_ptr() as *mut u8).add(1) };
        let allocation = Allocation::new(
            vk::DeviceMemory::from_raw(1),
            0,
            1,
            16,
            16,
            Some(misaligned as *mut c_void),
        );

        assert!(matches!(
            unsafe { allocation.as_slice::<u64>() },
            Err(AllocatorError::DeviceMemoryIsNotAlignedForType(_))
        ));
    }
}
