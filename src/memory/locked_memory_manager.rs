use {
    crate::memory::{Allocation, AllocatorError, MemoryDevice, MemoryManager},
    ash::vk,
    std::sync::{Mutex, MutexGuard},
};

/// A memory manager which can be shared between threads.
///
/// Every request locks the wrapped [MemoryManager] for its duration.
pub struct LockedMemoryManager<D: MemoryDevice> {
    manager: Mutex<MemoryManager<D>>,
}

impl<D: MemoryDevice> LockedMemoryManager<D> {
    pub fn new(manager: MemoryManager<D>) -> Self {
        Self {
            manager: Mutex::new(manager),
        }
    }

    /// Lock the manager and allocate memory.
    ///
    /// # Safety
    ///
    /// See [MemoryManager::allocate_memory].
    pub unsafe fn allocate_memory(
        &self,
        memory_requirements: vk::MemoryRequirements,
        property_flags: vk::MemoryPropertyFlags,
    ) -> Result<Allocation, AllocatorError> {
        self.lock()?
            .allocate_memory(memory_requirements, property_flags)
    }

    /// Lock the manager and free the allocation.
    ///
    /// # Safety
    ///
    /// See [MemoryManager::free].
    pub unsafe fn free(
        &self,
        allocation: &Allocation,
    ) -> Result<(), AllocatorError> {
        self.lock()?.free(allocation)
    }

    /// Lock the manager for direct access, e.g. for introspection.
    pub fn lock(
        &self,
    ) -> Result<MutexGuard<'_, MemoryManager<D>>, AllocatorError> {
        self.manager
            .lock()
            .map_err(|_| AllocatorError::ManagerLockPoisoned)
    }

    pub fn into_inner(self) -> Result<MemoryManager<D>, AllocatorError> {
        self.manager
            .into_inner()
            .map_err(|_| AllocatorError::ManagerLockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::memory::{
            fake_device::{
                host_visible, memory_properties, requirements, FakeDevice,
                HOST_VISIBLE_TYPE,
            },
            MemoryManagerConfig, Pool,
        },
        std::{sync::Arc, thread},
    };

    #[test]
    fn threads_share_one_manager() {
        let device = Arc::new(FakeDevice::default());
        let manager = LockedMemoryManager::new(
            MemoryManager::new(
                device.clone(),
                &memory_properties(),
                MemoryManagerConfig {
                    allocation_size: 4096,
                    min_page_size: 256,
                },
            )
            .unwrap(),
        );

        thread::scope(|scope| {
            for thread_index in 0..4 {
                let manager = &manager;
                scope.spawn(move || {
                    let allocations: Vec<Allocation> = (1..=8)
                        .map(|i| unsafe {
                            manager
                                .allocate_memory(
                                    requirements(i * 64 + thread_index),
                                    host_visible(),
                                )
                                .unwrap()
                        })
                        .collect();
                    for allocation in &allocations {
                        unsafe { manager.free(allocation).unwrap() };
                    }
                });
            }
        });

        let manager = manager.into_inner().unwrap();
        assert!(manager.pool_count(HOST_VISIBLE_TYPE) >= 1);
        assert!(manager.pools(HOST_VISIBLE_TYPE).iter().all(Pool::is_empty));

        drop(manager);
        assert_eq!(device.live_allocations(), 0);
    }
}
