use std::marker::PhantomData;
use std::mem;
use std::num::NonZeroU64;

use bytemuck::Pod;

/// Rounds `size` up to the next multiple of `alignment`.
pub(crate) fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment).max(1) * alignment
}

/// A uniform buffer holding one `T` per slot, addressed with dynamic offsets.
///
/// Slots are padded to the device's uniform offset alignment. The bind group exposes exactly one
/// `T` at binding 0.
pub(crate) struct DynamicUniformBuffer<T: Pod> {
    label: &'static str,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    bind_layout: wgpu::BindGroupLayout,
    stride: u64,
    capacity: u32,
    scratch: Vec<u8>,
    _marker: PhantomData<T>,
}

impl<T: Pod> DynamicUniformBuffer<T> {
    pub(crate) fn new(
        device: &wgpu::Device,
        label: &'static str,
        visibility: wgpu::ShaderStages,
        capacity: u32,
    ) -> Self {
        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(mem::size_of::<T>() as u64),
                },
                count: None,
            }],
        });

        let stride = aligned_stride(
            mem::size_of::<T>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let capacity = capacity.max(1);
        let buffer = Self::create_buffer(device, label, stride, capacity);
        let bind_group = Self::create_bind_group(device, label, &bind_layout, &buffer);

        Self {
            label,
            buffer,
            bind_group,
            bind_layout,
            stride,
            capacity,
            scratch: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn bind_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_layout
    }

    pub(crate) fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub(crate) fn capacity(&self) -> u32 {
        self.capacity
    }

    pub(crate) fn offset(&self, slot: usize) -> wgpu::DynamicOffset {
        (slot as u64 * self.stride) as wgpu::DynamicOffset
    }

    /// Uploads `items` into slots `0..items.len()`, growing the buffer when needed.
    pub(crate) fn write_all(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, items: &[T]) {
        let required = items.len() as u32;
        if required > self.capacity {
            self.grow(device, required);
        }
        self.write_at(queue, 0, items);
    }

    /// Uploads `items` starting at `first_slot`. Items beyond capacity are dropped with a warning.
    pub(crate) fn write_at(&mut self, queue: &wgpu::Queue, first_slot: usize, items: &[T]) {
        let available = (self.capacity as usize).saturating_sub(first_slot);
        if items.len() > available {
            log::warn!(
                "{}: writing {} slots at {} exceeds capacity {}",
                self.label,
                items.len(),
                first_slot,
                self.capacity
            );
        }
        let items = &items[..items.len().min(available)];
        if items.is_empty() {
            return;
        }

        let stride = self.stride as usize;
        self.scratch.clear();
        self.scratch.resize(items.len() * stride, 0);
        for (chunk, item) in self.scratch.chunks_exact_mut(stride).zip(items) {
            let bytes = bytemuck::bytes_of(item);
            chunk[..bytes.len()].copy_from_slice(bytes);
        }
        queue.write_buffer(
            &self.buffer,
            first_slot as u64 * self.stride,
            &self.scratch,
        );
    }

    fn grow(&mut self, device: &wgpu::Device, required: u32) {
        let new_capacity = required.max(self.capacity * 2);
        log::info!(
            "Growing {}: {} -> {}",
            self.label,
            self.capacity,
            new_capacity
        );
        self.buffer = Self::create_buffer(device, self.label, self.stride, new_capacity);
        self.bind_group =
            Self::create_bind_group(device, self.label, &self.bind_layout, &self.buffer);
        self.capacity = new_capacity;
    }

    fn create_buffer(
        device: &wgpu::Device,
        label: &str,
        stride: u64,
        capacity: u32,
    ) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(mem::size_of::<T>() as u64),
                }),
            }],
        })
    }
}

/// A plain uniform buffer holding a single `T`.
pub(crate) struct UniformBuffer<T: Pod> {
    buffer: wgpu::Buffer,
    _marker: PhantomData<T>,
}

impl<T: Pod> UniformBuffer<T> {
    pub(crate) fn new(device: &wgpu::Device, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: mem::size_of::<T>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            _marker: PhantomData,
        }
    }

    pub(crate) fn write(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }

    pub(crate) fn binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}
