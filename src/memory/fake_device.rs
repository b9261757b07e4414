//! A host-memory stand-in for the Vulkan device used by the allocator tests.

use {
    crate::memory::{AllocatorError, MemoryDevice},
    ash::vk::{self, Handle},
    std::{
        collections::{HashMap, HashSet},
        ffi::c_void,
        sync::Mutex,
    },
};

pub const DEVICE_LOCAL_TYPE: u32 = 0;
pub const HOST_VISIBLE_TYPE: u32 = 1;

/// Two memory types: device-local at index 0 and host-visible + coherent at
/// index 1.
pub fn memory_properties() -> vk::PhysicalDeviceMemoryProperties {
    let mut properties = vk::PhysicalDeviceMemoryProperties::default();
    properties.memory_type_count = 2;
    properties.memory_types[DEVICE_LOCAL_TYPE as usize] = vk::MemoryType {
        property_flags: vk::MemoryPropertyFlags::DEVICE_LOCAL,
        heap_index: 0,
    };
    properties.memory_types[HOST_VISIBLE_TYPE as usize] = vk::MemoryType {
        property_flags: vk::MemoryPropertyFlags::HOST_VISIBLE
            | vk::MemoryPropertyFlags::HOST_COHERENT,
        heap_index: 1,
    };
    properties
}

/// Requirements for a resource which can live in any memory type.
pub fn requirements(size: vk::DeviceSize) -> vk::MemoryRequirements {
    vk::MemoryRequirements {
        size,
        alignment: 1,
        memory_type_bits: u32::MAX,
    }
}

pub fn host_visible() -> vk::MemoryPropertyFlags {
    vk::MemoryPropertyFlags::HOST_VISIBLE
        | vk::MemoryPropertyFlags::HOST_COHERENT
}

#[derive(Default)]
struct State {
    next_handle: u64,
    blocks: HashMap<u64, Vec<u8>>,
    mapped: HashSet<u64>,
    total_allocations: usize,
    fail_allocations: bool,
    fail_mapping: bool,
}

#[derive(Default)]
pub struct FakeDevice {
    state: Mutex<State>,
}

impl FakeDevice {
    pub fn fail_allocations(&self, fail: bool) {
        self.state.lock().unwrap().fail_allocations = fail;
    }

    pub fn fail_mapping(&self, fail: bool) {
        self.state.lock().unwrap().fail_mapping = fail;
    }

    /// The number of device memory blocks which have not been freed.
    pub fn live_allocations(&self) -> usize {
        self.state.lock().unwrap().blocks.len()
    }

    /// The number of device memory blocks ever allocated.
    pub fn total_allocations(&self) -> usize {
        self.state.lock().unwrap().total_allocations
    }

    pub fn live_mappings(&self) -> usize {
        self.state.lock().unwrap().mapped.len()
    }
}

impl MemoryDevice for FakeDevice {
    unsafe fn allocate_memory(
        &self,
        allocate_info: &vk::MemoryAllocateInfo,
    ) -> Result<vk::DeviceMemory, AllocatorError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_allocations {
            return Err(AllocatorError::UnableToAllocateDeviceMemory(
                vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
            ));
        }
        state.next_handle += 1;
        state.total_allocations += 1;
        let handle = state.next_handle;
        state
            .blocks
            .insert(handle, vec![0; allocate_info.allocation_size as usize]);
        Ok(vk::DeviceMemory::from_raw(handle))
    }

    unsafe fn free_memory(&self, device_memory: vk::DeviceMemory) {
        let mut state = self.state.lock().unwrap();
        assert!(
            !state.mapped.contains(&device_memory.as_raw()),
            "memory must be unmapped before it is freed"
        );
        assert!(
            state.blocks.remove(&device_memory.as_raw()).is_some(),
            "double free of {:?}",
            device_memory
        );
    }

    unsafe fn map_memory(
        &self,
        device_memory: vk::DeviceMemory,
        size_in_bytes: vk::DeviceSize,
    ) -> Result<*mut c_void, AllocatorError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_mapping {
            return Err(AllocatorError::UnableToMapDeviceMemory(
                vk::Result::ERROR_MEMORY_MAP_FAILED,
            ));
        }
        let raw = device_memory.as_raw();
        assert!(state.mapped.insert(raw), "memory is already mapped");
        let block = state.blocks.get_mut(&raw).unwrap();
        assert_eq!(block.len() as vk::DeviceSize, size_in_bytes);
        Ok(block.as_mut_ptr() as *mut c_void)
    }

    unsafe fn unmap_memory(&self, device_memory: vk::DeviceMemory) {
        let mut state = self.state.lock().unwrap();
        assert!(state.mapped.remove(&device_memory.as_raw()));
    }
}
