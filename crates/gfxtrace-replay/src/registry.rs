// SPDX-License-Identifier: CEPL-1.0
use gfxtrace_render::*;
use std::collections::HashMap;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Entry<T> {
    /// Created by the replayer, destroyed with its origin.
    Owned(T),
    /// Provided by the host (back buffers, default framebuffer); never destroyed here.
    Borrowed(T),
}

impl<T: Copy> Entry<T> {
    fn live(&self) -> T {
        match *self {
            Entry::Owned(h) | Entry::Borrowed(h) => h,
        }
    }
}

/// Origin to live handle table of one object category.
pub struct HandleMap<T: Handle> {
    kind: &'static str,
    entries: HashMap<u64, Entry<T>>,
}

impl<T: Handle> HandleMap<T> {
    pub fn new(kind: &'static str) -> Self {
        HandleMap {
            kind,
            entries: HashMap::new(),
        }
    }

    /// Live handle of `origin`; null when the origin was never created or already destroyed.
    pub fn get(&self, origin: T) -> T {
        if origin.is_null() {
            return T::default();
        }
        match self.entries.get(&origin.raw()) {
            Some(entry) => entry.live(),
            None => {
                warn!(kind = self.kind, origin = origin.raw(), "unresolved handle");
                T::default()
            }
        }
    }

    pub fn contains(&self, origin: T) -> bool {
        self.entries.contains_key(&origin.raw())
    }

    pub fn is_borrowed(&self, origin: T) -> bool {
        matches!(self.entries.get(&origin.raw()), Some(Entry::Borrowed(_)))
    }

    /// Maps `origin` to an object the replayer created. Returns the owned object it replaces.
    pub fn insert_owned(&mut self, origin: T, live: T) -> Option<T> {
        Self::owned(self.entries.insert(origin.raw(), Entry::Owned(live)))
    }

    /// Maps `origin` to a host object. Returns the owned object it replaces.
    pub fn insert_borrowed(&mut self, origin: T, live: T) -> Option<T> {
        Self::owned(self.entries.insert(origin.raw(), Entry::Borrowed(live)))
    }

    /// Ends the mapping of an owned object and hands it back for destruction. Borrowed
    /// mappings survive.
    pub fn remove(&mut self, origin: T) -> Option<T> {
        match self.entries.get(&origin.raw()) {
            Some(Entry::Owned(_)) => Self::owned(self.entries.remove(&origin.raw())),
            _ => None,
        }
    }

    /// Drops any mapping of `origin` without destroying anything.
    pub fn forget(&mut self, origin: T) {
        self.entries.remove(&origin.raw());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every mapping, returning the owned objects in no particular order.
    pub fn drain_owned(&mut self) -> Vec<T> {
        self.entries
            .drain()
            .filter_map(|(_, entry)| Self::owned(Some(entry)))
            .collect()
    }

    fn owned(entry: Option<Entry<T>>) -> Option<T> {
        match entry {
            Some(Entry::Owned(h)) => Some(h),
            _ => None,
        }
    }
}

/// Per-category handle tables of one replay.
pub struct HandleRegistry {
    pub samplers: HandleMap<Sampler>,
    pub resources: HandleMap<Resource>,
    pub views: HandleMap<ResourceView>,
    pub pipelines: HandleMap<Pipeline>,
    pub layouts: HandleMap<PipelineLayout>,
    pub tables: HandleMap<DescriptorTable>,
}

impl Default for HandleRegistry {
    fn default() -> Self {
        HandleRegistry {
            samplers: HandleMap::new("sampler"),
            resources: HandleMap::new("resource"),
            views: HandleMap::new("resource view"),
            pipelines: HandleMap::new("pipeline"),
            layouts: HandleMap::new("pipeline layout"),
            tables: HandleMap::new("descriptor table"),
        }
    }
}

impl HandleRegistry {
    pub fn descriptors(&self, descriptors: &Descriptors) -> Descriptors {
        let views = |v: &[ResourceView]| -> Vec<ResourceView> {
            v.iter().map(|&h| self.views.get(h)).collect()
        };
        match descriptors {
            Descriptors::Samplers(v) => {
                Descriptors::Samplers(v.iter().map(|&h| self.samplers.get(h)).collect())
            }
            Descriptors::SamplersWithResourceViews(v) => Descriptors::SamplersWithResourceViews(
                v.iter()
                    .map(|d| SamplerWithResourceView {
                        sampler: self.samplers.get(d.sampler),
                        view: self.views.get(d.view),
                    })
                    .collect(),
            ),
            Descriptors::ShaderResourceViews(v) => Descriptors::ShaderResourceViews(views(v)),
            Descriptors::UnorderedAccessViews(v) => Descriptors::UnorderedAccessViews(views(v)),
            Descriptors::ShaderStorageBuffers(v) => Descriptors::ShaderStorageBuffers(views(v)),
            // only the buffer is an object; the range stays as recorded
            Descriptors::ConstantBuffers(v) => Descriptors::ConstantBuffers(
                v.iter()
                    .map(|r| BufferRange {
                        buffer: self.resources.get(r.buffer),
                        ..*r
                    })
                    .collect(),
            ),
        }
    }

    pub fn table_update(&self, update: &DescriptorTableUpdate) -> DescriptorTableUpdate {
        DescriptorTableUpdate {
            table: self.tables.get(update.table),
            binding: update.binding,
            array_offset: update.array_offset,
            descriptors: self.descriptors(&update.descriptors),
        }
    }

    pub fn table_copy(&self, copy: &DescriptorTableCopy) -> DescriptorTableCopy {
        DescriptorTableCopy {
            source_table: self.tables.get(copy.source_table),
            dest_table: self.tables.get(copy.dest_table),
            ..*copy
        }
    }

    pub fn texture_region(&self, region: &TextureRegion) -> TextureRegion {
        TextureRegion {
            resource: self.resources.get(region.resource),
            ..*region
        }
    }

    pub fn buffer_footprint(&self, footprint: &BufferFootprint) -> BufferFootprint {
        BufferFootprint {
            buffer: self.resources.get(footprint.buffer),
            ..*footprint
        }
    }

    /// Number of live mappings across all categories.
    pub fn len(&self) -> usize {
        self.samplers.len()
            + self.resources.len()
            + self.views.len()
            + self.pipelines.len()
            + self.layouts.len()
            + self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_and_unknown_origins_resolve_to_null() {
        let map = HandleMap::<Resource>::new("resource");
        assert_eq!(map.get(Resource::NULL), Resource::NULL);
        assert_eq!(map.get(Resource(0xdead)), Resource::NULL);
    }

    #[test]
    fn owned_mappings_come_back_for_destruction() {
        let mut map = HandleMap::<Sampler>::new("sampler");
        assert_eq!(map.insert_owned(Sampler(10), Sampler(1)), None);
        assert_eq!(map.get(Sampler(10)), Sampler(1));
        // origin reuse hands back the stale live object
        assert_eq!(map.insert_owned(Sampler(10), Sampler(2)), Some(Sampler(1)));
        assert_eq!(map.remove(Sampler(10)), Some(Sampler(2)));
        assert!(!map.contains(Sampler(10)));
    }

    #[test]
    fn borrowed_mappings_survive_destroy() {
        let mut map = HandleMap::<Resource>::new("resource");
        map.insert_borrowed(Resource(0x100), Resource(7));
        assert_eq!(map.remove(Resource(0x100)), None);
        assert_eq!(map.get(Resource(0x100)), Resource(7));
        map.forget(Resource(0x100));
        assert!(map.is_empty());
    }

    #[test]
    fn drain_skips_borrowed_objects() {
        let mut map = HandleMap::<Resource>::new("resource");
        map.insert_owned(Resource(1), Resource(11));
        map.insert_borrowed(Resource(2), Resource(12));
        assert_eq!(map.drain_owned(), vec![Resource(11)]);
        assert!(map.is_empty());
    }

    #[test]
    fn constant_buffers_keep_their_range() {
        let mut registry = HandleRegistry::default();
        registry.resources.insert_owned(Resource(5), Resource(50));
        registry.samplers.insert_owned(Sampler(6), Sampler(60));
        let remapped = registry.descriptors(&Descriptors::ConstantBuffers(vec![BufferRange {
            buffer: Resource(5),
            offset: 256,
            size: 64,
        }]));
        assert_eq!(
            remapped,
            Descriptors::ConstantBuffers(vec![BufferRange {
                buffer: Resource(50),
                offset: 256,
                size: 64,
            }])
        );
        let remapped = registry.descriptors(&Descriptors::SamplersWithResourceViews(vec![
            SamplerWithResourceView {
                sampler: Sampler(6),
                view: ResourceView(9),
            },
        ]));
        assert_eq!(
            remapped,
            Descriptors::SamplersWithResourceViews(vec![SamplerWithResourceView {
                sampler: Sampler(60),
                view: ResourceView::NULL,
            }])
        );
    }
}
