use {
    crate::memory::{chunk::Chunk, Allocation, AllocatorError, MemoryDevice},
    ash::vk,
    std::ffi::c_void,
};

/// One large block of device memory which is subdivided by a chunk tree.
///
/// Host-visible pools are mapped when they are created and stay mapped until
/// they are destroyed.
pub struct Pool {
    device_memory: vk::DeviceMemory,
    memory_type_index: u32,
    allocation_size: vk::DeviceSize,
    min_page_size: vk::DeviceSize,
    mapped_ptr: Option<*mut c_void>,
    root: Chunk,
}

// The mapped pointer is only dereferenced through allocations, and the
// manager which owns the pool must be locked to create them.
unsafe impl Send for Pool {}

impl Pool {
    /// Allocate a new pool from the device.
    ///
    /// # Safety
    ///
    /// Unsafe because the pool must be destroyed with the same device before
    /// the device is dropped.
    pub(super) unsafe fn new<D: MemoryDevice>(
        device: &D,
        memory_type_index: u32,
        property_flags: vk::MemoryPropertyFlags,
        allocation_size: vk::DeviceSize,
        min_page_size: vk::DeviceSize,
    ) -> Result<Self, AllocatorError> {
        let allocate_info = vk::MemoryAllocateInfo {
            allocation_size,
            memory_type_index,
            ..Default::default()
        };
        let device_memory = device.allocate_memory(&allocate_info)?;

        let mapped_ptr =
            if property_flags.contains(vk::MemoryPropertyFlags::HOST_VISIBLE) {
                match device.map_memory(device_memory, allocation_size) {
                    Ok(ptr) => Some(ptr),
                    Err(err) => {
                        device.free_memory(device_memory);
                        return Err(err);
                    }
                }
            } else {
                None
            };

        log::debug!(
            "Created a {} byte pool {:?} for memory type {} (mapped: {})",
            allocation_size,
            device_memory,
            memory_type_index,
            mapped_ptr.is_some()
        );

        Ok(Self {
            device_memory,
            memory_type_index,
            allocation_size,
            min_page_size,
            mapped_ptr,
            root: Chunk::new(0, allocation_size),
        })
    }

    pub fn device_memory(&self) -> vk::DeviceMemory {
        self.device_memory
    }

    pub fn memory_type_index(&self) -> u32 {
        self.memory_type_index
    }

    pub fn allocation_size(&self) -> vk::DeviceSize {
        self.allocation_size
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped_ptr.is_some()
    }

    /// True when nothing is allocated from this pool.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Build a byte-per-page map of the pool: 1 for pages covered by an
    /// allocation, 0 for free pages.
    ///
    /// Pages which belong to a split chunk but are not allocated themselves
    /// are reported as free even though they can't serve a whole-chunk
    /// request.
    pub fn page_occupancy(&self) -> Vec<u8> {
        let page_count = (self.allocation_size / self.min_page_size) as usize;
        let mut pages = vec![0; page_count];
        self.root.mark_occupied_pages(self.min_page_size, &mut pages);
        pages
    }

    /// Reserve space for `size_in_bytes` bytes.
    ///
    /// `requested_size_in_bytes` is recorded on the allocation as the caller's
    /// original request. Returns None if the pool has no room.
    pub(super) fn allocate(
        &mut self,
        size_in_bytes: vk::DeviceSize,
        requested_size_in_bytes: vk::DeviceSize,
    ) -> Option<Allocation> {
        let region = self.root.allocate(size_in_bytes, self.min_page_size)?;
        let cpu_mapped_ptr = self.mapped_ptr.map(|base| unsafe {
            // safe because the region is always inside the mapped pool
            (base as *mut u8).add(region.offset as usize) as *mut c_void
        });
        Some(Allocation::new(
            self.device_memory,
            self.memory_type_index,
            region.offset,
            region.size,
            requested_size_in_bytes,
            cpu_mapped_ptr,
        ))
    }

    /// Return an allocation's range to the chunk tree.
    pub(super) fn free(
        &mut self,
        allocation: &Allocation,
    ) -> Result<(), AllocatorError> {
        self.root
            .free(allocation.offset_in_bytes(), allocation.size_in_bytes())
    }

    /// Unmap and free the pool's device memory.
    ///
    /// # Safety
    ///
    /// Unsafe because every allocation from this pool is invalid afterwards
    /// and the GPU must no longer be using any of them.
    pub(super) unsafe fn destroy<D: MemoryDevice>(self, device: &D) {
        if self.mapped_ptr.is_some() {
            device.unmap_memory(self.device_memory);
        }
        device.free_memory(self.device_memory);
        log::debug!(
            "Destroyed pool {:?} for memory type {}",
            self.device_memory,
            self.memory_type_index
        );
    }
}
