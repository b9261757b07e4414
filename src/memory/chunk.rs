use {crate::memory::AllocatorError, ash::vk};

/// A contiguous byte range handed out by the chunk tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Region {
    pub offset: vk::DeviceSize,
    pub size: vk::DeviceSize,
}

/// A node in a pool's binary chunk tree.
///
/// Each chunk covers the power-of-two range `[offset, offset + size)`. A chunk
/// is either a leaf or owns exactly two children which each cover one half of
/// the range.
#[derive(Debug)]
pub struct Chunk {
    offset: vk::DeviceSize,
    size: vk::DeviceSize,

    /// True when no part of this chunk can serve a new allocation. Either the
    /// chunk itself is allocated or both of its children are full.
    full: bool,

    children: Option<Box<[Chunk; 2]>>,
}

impl Chunk {
    /// Create an empty leaf chunk.
    pub fn new(offset: vk::DeviceSize, size: vk::DeviceSize) -> Self {
        Self {
            offset,
            size,
            full: false,
            children: None,
        }
    }

    /// True when the chunk is an unallocated leaf.
    pub fn is_empty(&self) -> bool {
        !self.full && self.children.is_none()
    }

    /// Reserve the lowest-addressed range which can hold `size` bytes.
    ///
    /// Chunks are split in half until the request no longer fits in a half or
    /// until `min_page_size` is reached. A chunk which has been split can never
    /// serve a whole-chunk request again until its children are pruned by
    /// [Self::free].
    ///
    /// Returns None when there is no room in this chunk. A failed call leaves
    /// the tree untouched.
    pub fn allocate(
        &mut self,
        size: vk::DeviceSize,
        min_page_size: vk::DeviceSize,
    ) -> Option<Region> {
        if self.full || size > self.size {
            return None;
        }

        if self.size <= min_page_size {
            self.full = true;
            return Some(self.region());
        }

        let half = self.size / 2;
        if size > half {
            if self.children.is_some() {
                return None;
            }
            self.full = true;
            return Some(self.region());
        }

        let offset = self.offset;
        let children = self.children.get_or_insert_with(|| {
            Box::new([
                Chunk::new(offset, half),
                Chunk::new(offset + half, half),
            ])
        });

        let region = match children[0].allocate(size, min_page_size) {
            Some(region) => region,
            None => children[1].allocate(size, min_page_size)?,
        };
        self.full = children[0].full && children[1].full;

        Some(region)
    }

    /// Release the range previously returned by [Self::allocate].
    ///
    /// Sibling leaves which are both free are pruned on the way back up so the
    /// parent can serve whole-chunk requests again.
    pub fn free(
        &mut self,
        offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> Result<(), AllocatorError> {
        if self.offset == offset && self.size == size {
            self.full = false;
            return Ok(());
        }

        let corrupt = AllocatorError::CorruptChunkTree { offset, size };
        if !self.contains(offset) || size >= self.size {
            return Err(corrupt);
        }

        let half = self.size / 2;
        let children = self.children.as_mut().ok_or(corrupt)?;
        let index = if offset >= self.offset + half { 1 } else { 0 };
        children[index].free(offset, size)?;

        if children.iter().all(Chunk::is_empty) {
            self.children = None;
        }
        self.full = false;

        Ok(())
    }

    /// Set `pages[i] = 1` for every page covered by a full chunk.
    ///
    /// `pages` holds one entry per `page_size` bytes of the root chunk.
    pub fn mark_occupied_pages(
        &self,
        page_size: vk::DeviceSize,
        pages: &mut [u8],
    ) {
        if self.full {
            let first = (self.offset / page_size) as usize;
            let count = (self.size / page_size).max(1) as usize;
            let last = (first + count).min(pages.len());
            pages[first.min(last)..last].fill(1);
            return;
        }
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.mark_occupied_pages(page_size, pages);
            }
        }
    }

    fn contains(&self, offset: vk::DeviceSize) -> bool {
        offset >= self.offset && offset < self.offset + self.size
    }

    fn region(&self) -> Region {
        Region {
            offset: self.offset,
            size: self.size,
        }
    }
}
