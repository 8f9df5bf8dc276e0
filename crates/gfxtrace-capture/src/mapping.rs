// SPDX-License-Identifier: CEPL-1.0
use gfxtrace_render::{MapAccess, Resource, SubresourceBox};
use std::ptr::NonNull;

/// Address of host-visible memory handed out by a native map call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MappedPtr(pub NonNull<u8>);

// Only dereferenced while the owning recorder lock is held and the native mapping is live.
unsafe impl Send for MappedPtr {}

#[derive(Clone, Copy, Debug)]
pub struct BufferMapping {
    pub resource: Resource,
    pub offset: u64,
    pub size: u64,
    pub access: MapAccess,
    pub data: MappedPtr,
}

#[derive(Clone, Copy, Debug)]
pub struct TextureMapping {
    pub resource: Resource,
    pub subresource: u32,
    pub region: Option<SubresourceBox>,
    pub access: MapAccess,
    pub data: MappedPtr,
    pub row_pitch: u32,
    pub slice_pitch: u32,
    /// Bytes the native map made addressable.
    pub len: usize,
    pub refs: u32,
}

/// Maps that are open on the traced device, waiting for their unmap.
#[derive(Default)]
pub struct MappingTable {
    buffers: Vec<BufferMapping>,
    textures: Vec<TextureMapping>,
}

impl MappingTable {
    pub fn len(&self) -> usize {
        self.buffers.len() + self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert_buffer(&mut self, mapping: BufferMapping) {
        self.buffers.push(mapping);
    }

    /// Removes the oldest open map of `resource`.
    pub fn take_buffer(&mut self, resource: Resource) -> Option<BufferMapping> {
        let index = self.buffers.iter().position(|m| m.resource == resource)?;
        Some(self.buffers.remove(index))
    }

    /// Records a texture map. Mapping the same subresource again at the same address counts
    /// as a nested map of the oldest such record.
    pub fn insert_texture(&mut self, mapping: TextureMapping) {
        let nested = self.textures.iter_mut().find(|m| {
            m.resource == mapping.resource
                && m.subresource == mapping.subresource
                && m.data == mapping.data
        });
        match nested {
            Some(existing) => existing.refs += 1,
            None => self.textures.push(TextureMapping {
                refs: 1,
                ..mapping
            }),
        }
    }

    /// Releases one reference of the newest matching texture map and returns a copy of it.
    /// The record is dropped once no reference remains.
    pub fn release_texture(&mut self, resource: Resource, subresource: u32) -> Option<TextureMapping> {
        let index = self
            .textures
            .iter()
            .rposition(|m| m.resource == resource && m.subresource == subresource)?;
        let record = &mut self.textures[index];
        record.refs = record.refs.saturating_sub(1);
        let released = *record;
        if released.refs == 0 {
            self.textures.remove(index);
        }
        Some(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ptr(addr: usize) -> MappedPtr {
        MappedPtr(NonNull::new(addr as *mut u8).unwrap())
    }

    fn texture(resource: u64, subresource: u32, addr: usize) -> TextureMapping {
        TextureMapping {
            resource: Resource(resource),
            subresource,
            region: None,
            access: MapAccess::WriteOnly,
            data: ptr(addr),
            row_pitch: 16,
            slice_pitch: 64,
            len: 64,
            refs: 0,
        }
    }

    #[test]
    fn buffer_maps_match_oldest_first() {
        let mut table = MappingTable::default();
        for offset in [0, 32] {
            table.insert_buffer(BufferMapping {
                resource: Resource(3),
                offset,
                size: 16,
                access: MapAccess::WriteOnly,
                data: ptr(0x1000 + offset as usize),
            });
        }
        assert_eq!(table.take_buffer(Resource(3)).unwrap().offset, 0);
        assert_eq!(table.take_buffer(Resource(3)).unwrap().offset, 32);
        assert!(table.take_buffer(Resource(3)).is_none());
    }

    #[test]
    fn nested_texture_maps_share_a_record() {
        let mut table = MappingTable::default();
        table.insert_texture(texture(5, 1, 0x2000));
        table.insert_texture(texture(5, 1, 0x2000));
        assert_eq!(table.len(), 1);

        assert_eq!(table.release_texture(Resource(5), 1).unwrap().refs, 1);
        assert_eq!(table.len(), 1);
        assert_eq!(table.release_texture(Resource(5), 1).unwrap().refs, 0);
        assert!(table.is_empty());
        assert!(table.release_texture(Resource(5), 1).is_none());
    }

    #[test]
    fn distinct_addresses_are_released_newest_first() {
        let mut table = MappingTable::default();
        table.insert_texture(texture(5, 0, 0x2000));
        table.insert_texture(texture(5, 0, 0x3000));
        assert_eq!(table.len(), 2);
        assert_eq!(table.release_texture(Resource(5), 0).unwrap().data, ptr(0x3000));
        assert_eq!(table.release_texture(Resource(5), 0).unwrap().data, ptr(0x2000));
    }

    #[test]
    fn nested_map_joins_the_oldest_matching_record() {
        let mut table = MappingTable::default();
        table.insert_texture(texture(5, 0, 0x2000));
        table.insert_texture(texture(5, 0, 0x3000));
        table.insert_texture(texture(5, 0, 0x2000));
        assert_eq!(table.len(), 2);

        // newest record goes first and leaves the shared one behind
        assert_eq!(table.release_texture(Resource(5), 0).unwrap().data, ptr(0x3000));
        let shared = table.release_texture(Resource(5), 0).unwrap();
        assert_eq!((shared.data, shared.refs), (ptr(0x2000), 1));
        assert_eq!(table.len(), 1);
    }
}
