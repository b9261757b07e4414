use {crate::logging::PrettyList, ash::vk, std::fmt};

/// A snapshot of the memory types reported by the physical device.
#[derive(Debug, Clone)]
pub struct MemoryProperties {
    memory_types: Vec<vk::MemoryType>,
}

impl MemoryProperties {
    pub fn new(properties: &vk::PhysicalDeviceMemoryProperties) -> Self {
        let count = (properties.memory_type_count as usize)
            .min(properties.memory_types.len());
        Self {
            memory_types: properties.memory_types[..count].to_vec(),
        }
    }

    pub fn memory_types(&self) -> &[vk::MemoryType] {
        &self.memory_types
    }

    /// The property flags for a memory type. Empty if the index is not a
    /// valid memory type.
    pub fn property_flags(
        &self,
        memory_type_index: u32,
    ) -> vk::MemoryPropertyFlags {
        self.memory_types
            .get(memory_type_index as usize)
            .map(|memory_type| memory_type.property_flags)
            .unwrap_or_else(vk::MemoryPropertyFlags::empty)
    }

    /// Find the first memory type which is allowed by `memory_type_bits` and
    /// which has every flag in `property_flags`.
    ///
    /// Types are checked in ascending index order, which is the device's
    /// order of preference.
    pub fn find_memory_type_index(
        &self,
        memory_type_bits: u32,
        property_flags: vk::MemoryPropertyFlags,
    ) -> Option<u32> {
        self.memory_types
            .iter()
            .enumerate()
            .find(|(i, memory_type)| {
                let type_supported = memory_type_bits & (1 << i) != 0;
                let properties_supported =
                    memory_type.property_flags.contains(property_flags);
                type_supported & properties_supported
            })
            .map(|(i, _memory_type)| i as u32)
    }
}

impl fmt::Display for MemoryProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: Vec<String> = self
            .memory_types
            .iter()
            .enumerate()
            .map(|(i, memory_type)| {
                format!(
                    "{} heap {} {:?}",
                    i, memory_type.heap_index, memory_type.property_flags
                )
            })
            .collect();
        write!(f, "Memory types: {}", PrettyList(&types))
    }
}
