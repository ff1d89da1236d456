// surfbridge/src/tests/attachment.rs
//
//! Tests for framebuffer attachments.

use crate::{AttachmentTarget, AttachmentType, ContextID, DirtyChannel, DirtyReceiver, Error};
use crate::{FormatInfo, FramebufferAttachment, FramebufferAttachmentObject, ImageIndex};
use crate::{MultiviewLayout, RenderTarget, SubjectMessage};

use euclid::default::{Point2D, Size2D};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const CONTEXT: ContextID = ContextID(7);
const ORIGIN: Point2D<i32> = Point2D::new(0, 0);

#[derive(Clone, Copy, Debug, PartialEq)]
enum Event {
    Attach(u32),
    Detach(u32),
}

// A resource that logs its attach/detach notifications into a shared log.
struct TestTexture {
    id: u32,
    format: u32,
    size: Size2D<i32>,
    attach_count: AtomicUsize,
    events: Arc<Mutex<Vec<Event>>>,
    dirty_channel: DirtyChannel,
}

impl TestTexture {
    fn new(id: u32, events: &Arc<Mutex<Vec<Event>>>) -> Arc<TestTexture> {
        Arc::new(TestTexture {
            id,
            format: glow::RGBA8,
            size: Size2D::new(256, 128),
            attach_count: AtomicUsize::new(0),
            events: events.clone(),
            dirty_channel: DirtyChannel::new(),
        })
    }

    fn attach_count(&self) -> usize {
        self.attach_count.load(Ordering::SeqCst)
    }
}

impl FramebufferAttachmentObject for TestTexture {
    fn id(&self) -> u32 {
        self.id
    }

    fn on_attach(&self, _: ContextID) {
        self.attach_count.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(Event::Attach(self.id));
    }

    fn on_detach(&self, _: ContextID) {
        self.attach_count.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(Event::Detach(self.id));
    }

    // Each mip level halves the size.
    fn attachment_size(&self, image_index: &ImageIndex) -> Size2D<i32> {
        let level = image_index.mip_index.max(0);
        Size2D::new((self.size.width >> level).max(1), (self.size.height >> level).max(1))
    }

    fn attachment_format(&self, _: u32, _: &ImageIndex) -> FormatInfo {
        FormatInfo::from_internal_format(self.format)
    }

    fn attachment_samples(&self, _: &ImageIndex) -> i32 {
        4
    }

    fn attachment_render_target(&self, _: ContextID, binding: u32, image_index: &ImageIndex)
                                -> Result<RenderTarget, Error> {
        Ok(RenderTarget { native_object: self.id as usize, binding, image_index: *image_index })
    }

    fn dirty_channel(&self) -> &DirtyChannel {
        &self.dirty_channel
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn event_log() -> Arc<Mutex<Vec<Event>>> {
    Arc::new(Mutex::new(vec![]))
}

fn texture_attachment(texture: &Arc<TestTexture>, image_index: ImageIndex)
                      -> FramebufferAttachment {
    FramebufferAttachment::with_resource(CONTEXT,
                                         AttachmentType::Texture,
                                         glow::COLOR_ATTACHMENT0,
                                         image_index,
                                         texture.clone())
}

#[test]
fn test_new_attachment_is_empty() {
    let attachment = FramebufferAttachment::new();
    assert!(!attachment.is_attached());
    assert_eq!(attachment.attachment_type(), AttachmentType::None);
    assert_eq!(*attachment.target(), AttachmentTarget::default());
    assert_eq!(attachment.id(), 0);
    assert_eq!(attachment.num_views(), 1);
    assert_eq!(attachment.multiview_layout(), MultiviewLayout::None);
    assert_eq!(attachment.base_view_index(), 0);
    assert_eq!(attachment.multiview_viewport_offsets(), &[ORIGIN][..]);
    assert_eq!(attachment.format(), FormatInfo::NONE);
    assert_eq!(attachment.size(), Size2D::zero());
    assert_eq!(attachment.samples(), 0);
    assert_eq!(attachment.render_target(CONTEXT).unwrap_err(), Error::NotAttached);
    assert_eq!(attachment, FramebufferAttachment::default());
}

#[test]
fn test_attach_texture() {
    let events = event_log();
    let texture = TestTexture::new(3, &events);
    let mut attachment = texture_attachment(&texture, ImageIndex::make_2d(1));

    assert!(attachment.is_attached());
    assert_eq!(attachment.attachment_type(), AttachmentType::Texture);
    assert_eq!(attachment.binding(), glow::COLOR_ATTACHMENT0);
    assert_eq!(attachment.id(), 3);
    assert_eq!(attachment.mip_level(), 1);
    assert_eq!(attachment.cube_map_face(), glow::NONE);
    assert_eq!(attachment.layer(), 0);
    assert_eq!(attachment.size().to_tuple(), (128, 64));
    assert_eq!(attachment.samples(), 4);
    assert_eq!((attachment.red_size(), attachment.alpha_size()), (8, 8));
    assert_eq!((attachment.depth_size(), attachment.stencil_size()), (0, 0));
    assert_eq!(attachment.component_type(), glow::UNSIGNED_NORMALIZED);
    assert_eq!(attachment.color_encoding(), glow::LINEAR);

    assert!(attachment.texture().is_some());
    assert!(attachment.renderbuffer().is_none());
    assert!(attachment.surface().is_none());
    assert_eq!(attachment.resource_as::<TestTexture>().map(|texture| texture.id), Some(3));

    let render_target = attachment.render_target(CONTEXT).unwrap();
    assert_eq!(render_target, RenderTarget {
        native_object: 3,
        binding: glow::COLOR_ATTACHMENT0,
        image_index: ImageIndex::make_2d(1),
    });

    assert_eq!(texture.attach_count(), 1);
    attachment.detach(CONTEXT);
    assert_eq!(texture.attach_count(), 0);
    assert_eq!(*events.lock().unwrap(), vec![Event::Attach(3), Event::Detach(3)]);
}

#[test]
fn test_replacing_resource_attaches_new_one_first() {
    let events = event_log();
    let first = TestTexture::new(1, &events);
    let second = TestTexture::new(2, &events);
    let mut attachment = texture_attachment(&first, ImageIndex::make_2d(0));

    attachment.attach(CONTEXT,
                      AttachmentType::Texture,
                      glow::COLOR_ATTACHMENT0,
                      ImageIndex::make_2d(0),
                      Some(second.clone() as Arc<dyn FramebufferAttachmentObject>));
    assert_eq!(attachment.id(), 2);
    assert_eq!((first.attach_count(), second.attach_count()), (0, 1));
    assert_eq!(*events.lock().unwrap(),
               vec![Event::Attach(1), Event::Attach(2), Event::Detach(1)]);

    attachment.attach(CONTEXT, AttachmentType::None, glow::NONE, ImageIndex::invalid(), None);
    assert!(!attachment.is_attached());
    assert_eq!(second.attach_count(), 0);
}

#[test]
fn test_reattaching_same_resource_keeps_it_attached() {
    let events = event_log();
    let texture = TestTexture::new(5, &events);
    let mut attachment = texture_attachment(&texture, ImageIndex::make_2d(0));
    events.lock().unwrap().clear();

    attachment.attach(CONTEXT,
                      AttachmentType::Texture,
                      glow::COLOR_ATTACHMENT0,
                      ImageIndex::make_2d(2),
                      Some(texture.clone() as Arc<dyn FramebufferAttachmentObject>));
    // The count never reaches zero in between.
    assert_eq!(*events.lock().unwrap(), vec![Event::Attach(5), Event::Detach(5)]);
    assert_eq!(texture.attach_count(), 1);
    assert_eq!(attachment.mip_level(), 2);

    attachment.detach(CONTEXT);
}

#[test]
fn test_cube_map_and_layered_indices() {
    let events = event_log();
    let texture = TestTexture::new(1, &events);

    let mut cube = texture_attachment(&texture,
                                      ImageIndex::make_cube(glow::TEXTURE_CUBE_MAP_NEGATIVE_Y, 0));
    assert_eq!(cube.cube_map_face(), glow::TEXTURE_CUBE_MAP_NEGATIVE_Y);
    assert_eq!(cube.texture_image_index().layer_index, 3);
    // Cube faces aren't layers.
    assert_eq!(cube.layer(), 0);

    let mut array = texture_attachment(&texture, ImageIndex::make_2d_array(0, 4));
    assert_eq!(array.layer(), 4);
    assert_eq!(array.cube_map_face(), glow::NONE);

    let mut volume = texture_attachment(&texture, ImageIndex::make_3d(1, 2));
    assert_eq!(volume.layer(), 2);
    assert_eq!(volume.mip_level(), 1);

    assert_eq!(texture.attach_count(), 3);
    for attachment in [&mut cube, &mut array, &mut volume] {
        attachment.detach(CONTEXT);
    }
    assert_eq!(texture.attach_count(), 0);
}

#[test]
fn test_multiview() {
    let events = event_log();
    let texture = TestTexture::new(1, &events);
    let mut attachment = texture_attachment(&texture, ImageIndex::make_2d_array(0, 0));

    let offsets = vec![Point2D::new(0, 0), Point2D::new(128, 0)];
    attachment.set_multiview_side_by_side(offsets.clone());
    assert_eq!(attachment.num_views(), 2);
    assert_eq!(attachment.multiview_layout(), MultiviewLayout::SideBySide);
    assert_eq!(attachment.multiview_viewport_offsets(), &offsets[..]);

    attachment.set_multiview_layered(3, 1);
    assert_eq!(attachment.num_views(), 3);
    assert_eq!(attachment.multiview_layout(), MultiviewLayout::Layered);
    assert_eq!(attachment.base_view_index(), 1);
    assert_eq!(attachment.multiview_viewport_offsets(), &[ORIGIN; 3][..]);

    attachment.detach(CONTEXT);
    assert_eq!(attachment.num_views(), 1);
    assert_eq!(attachment.multiview_layout(), MultiviewLayout::None);
    assert_eq!(attachment.base_view_index(), 0);
    assert_eq!(attachment.multiview_viewport_offsets(), &[ORIGIN][..]);
    assert_eq!(*attachment.target(), AttachmentTarget::default());
}

#[test]
fn test_equality() {
    let events = event_log();
    let texture = TestTexture::new(1, &events);
    let other = TestTexture::new(1, &events);

    let mut a = texture_attachment(&texture, ImageIndex::make_2d(0));
    let mut b = texture_attachment(&texture, ImageIndex::make_2d(0));
    let mut c = texture_attachment(&texture, ImageIndex::make_2d(1));
    // Same name, different object.
    let mut d = texture_attachment(&other, ImageIndex::make_2d(0));
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);

    b.set_multiview_layered(2, 0);
    assert_ne!(a, b);

    // Image indices only matter for textures.
    let renderbuffer = |index| {
        FramebufferAttachment::with_resource(CONTEXT,
                                             AttachmentType::Renderbuffer,
                                             glow::DEPTH_ATTACHMENT,
                                             index,
                                             texture.clone())
    };
    let mut e = renderbuffer(ImageIndex::invalid());
    let mut f = renderbuffer(ImageIndex::make_2d(3));
    assert_eq!(e, f);
    assert!(e.texture().is_none());
    assert!(e.renderbuffer().is_some());
    assert_ne!(a, e);

    for attachment in [&mut a, &mut b, &mut c, &mut d, &mut e, &mut f] {
        attachment.detach(CONTEXT);
    }
    assert_eq!(a, FramebufferAttachment::new());
}

struct CountingReceiver {
    messages: Mutex<Vec<SubjectMessage>>,
}

impl CountingReceiver {
    fn new() -> Arc<CountingReceiver> {
        Arc::new(CountingReceiver { messages: Mutex::new(vec![]) })
    }

    fn messages(&self) -> Vec<SubjectMessage> {
        self.messages.lock().unwrap().clone()
    }
}

impl DirtyReceiver for CountingReceiver {
    fn on_subject_state_change(&self, message: SubjectMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

#[test]
fn test_dirty_channel() {
    let channel = DirtyChannel::new();
    let first = CountingReceiver::new();
    let second = CountingReceiver::new();
    let first_receiver: Arc<dyn DirtyReceiver> = first.clone();
    let second_receiver: Arc<dyn DirtyReceiver> = second.clone();

    channel.subscribe(&first_receiver);
    channel.subscribe(&first_receiver);
    channel.subscribe(&second_receiver);
    assert_eq!(channel.receiver_count(), 2);

    channel.signal(SubjectMessage::StorageChanged);
    assert_eq!(first.messages(), vec![SubjectMessage::StorageChanged]);
    assert_eq!(second.messages(), vec![SubjectMessage::StorageChanged]);

    channel.unsubscribe(&first_receiver);
    channel.signal(SubjectMessage::ContentsChanged);
    assert_eq!(first.messages().len(), 1);
    assert_eq!(second.messages().len(), 2);

    // Receivers are held weakly.
    drop((second, second_receiver));
    assert_eq!(channel.receiver_count(), 0);
    channel.signal(SubjectMessage::SubjectDestroyed);
}

#[test]
fn test_resource_dirty_channel() {
    let events = event_log();
    let texture = TestTexture::new(1, &events);
    let receiver = CountingReceiver::new();
    let dyn_receiver: Arc<dyn DirtyReceiver> = receiver.clone();

    let mut attachment = texture_attachment(&texture, ImageIndex::make_2d(0));
    if let Some(resource) = attachment.resource() {
        resource.dirty_channel().subscribe(&dyn_receiver);
    }
    texture.dirty_channel().signal(SubjectMessage::ContentsChanged);
    assert_eq!(receiver.messages(), vec![SubjectMessage::ContentsChanged]);
    attachment.detach(CONTEXT);
}

#[test]
fn test_image_index() {
    let invalid = ImageIndex::invalid();
    assert!(!invalid.is_valid());
    assert!(!invalid.has_layer());
    assert_eq!(ImageIndex::default(), invalid);

    let index = ImageIndex::make_2d(2);
    assert!(index.is_valid());
    assert!(!index.has_layer());

    let index = ImageIndex::make_cube(glow::TEXTURE_CUBE_MAP_POSITIVE_X, 0);
    assert_eq!(index.layer_index, 0);
    assert!(index.has_layer());

    assert_eq!(AttachmentType::Texture.object_type(), glow::TEXTURE);
    assert_eq!(AttachmentType::Renderbuffer.object_type(), glow::RENDERBUFFER);
    assert_eq!(AttachmentType::Surface.object_type(), glow::FRAMEBUFFER_DEFAULT);
    assert_eq!(AttachmentType::None.object_type(), glow::NONE);
}

#[test]
fn test_format_lookups() {
    assert_eq!(FormatInfo::color_format_for_sizes(8, 8, 8, 8), Some(glow::RGBA8));
    assert_eq!(FormatInfo::color_format_for_sizes(5, 6, 5, 0), Some(glow::RGB565));
    assert_eq!(FormatInfo::color_format_for_sizes(6, 6, 6, 0), None);
    assert_eq!(FormatInfo::depth_stencil_format_for_sizes(0, 0), Some(glow::ZERO));
    assert_eq!(FormatInfo::depth_stencil_format_for_sizes(24, 8), Some(glow::DEPTH24_STENCIL8));
    assert_eq!(FormatInfo::depth_stencil_format_for_sizes(32, 0), None);

    let depth_stencil = FormatInfo::from_internal_format(glow::DEPTH24_STENCIL8);
    assert_eq!((depth_stencil.depth_bits, depth_stencil.stencil_bits), (24, 8));
    assert_eq!(depth_stencil.red_bits, 0);
    let unknown = FormatInfo::from_internal_format(0x1234);
    assert_eq!(unknown.internal_format, 0x1234);
    assert_eq!(unknown.red_bits, 0);
}
