use {
    crate::memory::{
        Allocation, AllocatorError, MemoryDevice, MemoryProperties, Pool,
    },
    ash::vk,
};

/// The size of each pool requested from the device: 128 MiB.
pub const DEFAULT_POOL_ALLOCATION_SIZE: vk::DeviceSize = 128 * 1024 * 1024;

/// The smallest range ever handed out by a pool: 4 KiB.
pub const DEFAULT_MIN_PAGE_SIZE: vk::DeviceSize = 4 * 1024;

/// Pool sizing for a [MemoryManager]. Fixed for the manager's lifetime.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryManagerConfig {
    /// The size of every pool, and the largest allocation the manager can
    /// satisfy.
    pub allocation_size: vk::DeviceSize,

    /// The smallest chunk size. Requests smaller than this are padded.
    pub min_page_size: vk::DeviceSize,
}

impl Default for MemoryManagerConfig {
    fn default() -> Self {
        Self {
            allocation_size: DEFAULT_POOL_ALLOCATION_SIZE,
            min_page_size: DEFAULT_MIN_PAGE_SIZE,
        }
    }
}

impl MemoryManagerConfig {
    fn validate(&self) -> Result<(), AllocatorError> {
        let valid = self.allocation_size.is_power_of_two()
            && self.min_page_size.is_power_of_two()
            && self.min_page_size <= self.allocation_size;
        if valid {
            Ok(())
        } else {
            Err(AllocatorError::InvalidPoolConfiguration {
                allocation_size: self.allocation_size,
                min_page_size: self.min_page_size,
            })
        }
    }
}

/// Sub-allocates device memory from large per-memory-type pools.
///
/// Pools are created on demand and are only released when the manager is
/// destroyed. The manager is not internally synchronized, see
/// [crate::memory::LockedMemoryManager] for sharing it between threads.
pub struct MemoryManager<D: MemoryDevice> {
    /// Pools for each memory type, indexed by memory type index. New pools are
    /// appended to the end.
    pools: Vec<Vec<Pool>>,
    memory_properties: MemoryProperties,
    config: MemoryManagerConfig,
    device: D,
}

impl<D: MemoryDevice> MemoryManager<D> {
    /// Create a memory manager for the device's memory types. No device
    /// memory is allocated until the first request.
    pub fn new(
        device: D,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        config: MemoryManagerConfig,
    ) -> Result<Self, AllocatorError> {
        config.validate()?;
        let memory_properties = MemoryProperties::new(memory_properties);

        log::debug!("Creating memory manager with {:#?}", config);
        log::trace!("{}", memory_properties);

        let pools = memory_properties
            .memory_types()
            .iter()
            .map(|_| vec![])
            .collect();

        Ok(Self {
            pools,
            memory_properties,
            config,
            device,
        })
    }

    pub fn config(&self) -> MemoryManagerConfig {
        self.config
    }

    pub fn memory_properties(&self) -> &MemoryProperties {
        &self.memory_properties
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Allocate memory which meets the requirements and has every one of
    /// the requested property flags.
    ///
    /// The reserved size is the requested size rounded up to a power of two
    /// no smaller than the page size or the required alignment.
    ///
    /// # Safety
    ///
    /// Unsafe because the caller must free the allocation with this manager
    /// and must not use it after the manager is destroyed.
    pub unsafe fn allocate_memory(
        &mut self,
        memory_requirements: vk::MemoryRequirements,
        property_flags: vk::MemoryPropertyFlags,
    ) -> Result<Allocation, AllocatorError> {
        let size_in_bytes =
            memory_requirements.size.max(memory_requirements.alignment);
        if size_in_bytes > self.config.allocation_size {
            return Err(AllocatorError::AllocationTooLarge {
                requested: size_in_bytes,
                allocation_size: self.config.allocation_size,
            });
        }

        let memory_type_index = self
            .memory_properties
            .find_memory_type_index(
                memory_requirements.memory_type_bits,
                property_flags,
            )
            .ok_or(AllocatorError::MemoryTypeNotFound(
                property_flags,
                memory_requirements,
            ))?;

        let pools = &mut self.pools[memory_type_index as usize];
        for pool in pools.iter_mut() {
            if let Some(allocation) =
                pool.allocate(size_in_bytes, memory_requirements.size)
            {
                log::trace!("Allocated {:?}", allocation);
                return Ok(allocation);
            }
        }

        let mut pool = Pool::new(
            &self.device,
            memory_type_index,
            self.memory_properties.property_flags(memory_type_index),
            self.config.allocation_size,
            self.config.min_page_size,
        )?;
        let allocation =
            match pool.allocate(size_in_bytes, memory_requirements.size) {
                Some(allocation) => allocation,
                None => {
                    pool.destroy(&self.device);
                    return Err(AllocatorError::AllocationTooLarge {
                        requested: size_in_bytes,
                        allocation_size: self.config.allocation_size,
                    });
                }
            };
        pools.push(pool);

        log::trace!("Allocated {:?} from a new pool", allocation);
        Ok(allocation)
    }

    /// Return an allocation to its pool.
    ///
    /// Null allocations and allocations whose memory isn't owned by this
    /// manager are ignored.
    ///
    /// # Safety
    ///
    /// Unsafe because the GPU must no longer be using the memory, and the
    /// allocation must not be freed twice.
    pub unsafe fn free(
        &mut self,
        allocation: &Allocation,
    ) -> Result<(), AllocatorError> {
        if allocation.is_null() {
            return Ok(());
        }

        let pool = self
            .pools
            .get_mut(allocation.memory_type_index() as usize)
            .and_then(|pools| {
                pools.iter_mut().find(|pool| {
                    pool.device_memory() == allocation.device_memory()
                })
            });

        match pool {
            Some(pool) => pool.free(allocation).map_err(|err| {
                log::error!("Unable to free {:?}: {}", allocation, err);
                err
            }),
            None => {
                log::warn!(
                    "Ignoring free for memory not owned by this manager {:?}",
                    allocation
                );
                Ok(())
            }
        }
    }

    /// The number of pools allocated for a memory type.
    pub fn pool_count(&self, memory_type_index: u32) -> usize {
        self.pools
            .get(memory_type_index as usize)
            .map_or(0, |pools| pools.len())
    }

    /// The pools for a memory type, in allocation order.
    pub fn pools(&self, memory_type_index: u32) -> &[Pool] {
        self.pools
            .get(memory_type_index as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Page occupancy for every pool of a memory type. See
    /// [Pool::page_occupancy].
    pub fn page_occupancy(&self, memory_type_index: u32) -> Vec<Vec<u8>> {
        self.pools(memory_type_index)
            .iter()
            .map(Pool::page_occupancy)
            .collect()
    }

    /// Release every pool back to the device.
    ///
    /// This is called automatically when the manager is dropped.
    ///
    /// # Safety
    ///
    /// Unsafe because every allocation from this manager is invalid
    /// afterwards. The GPU must not be using any of them.
    pub unsafe fn destroy(&mut self) {
        for pools in self.pools.iter_mut() {
            for pool in pools.drain(..) {
                if !pool.is_empty() {
                    log::warn!(
                        "Destroying pool {:?} with live allocations",
                        pool.device_memory()
                    );
                }
                pool.destroy(&self.device);
            }
        }
    }
}

impl<D: MemoryDevice> Drop for MemoryManager<D> {
    fn drop(&mut self) {
        // safe because the manager is being dropped, there's no way to use it
        // for new allocations
        unsafe { self.destroy() }
    }
}
