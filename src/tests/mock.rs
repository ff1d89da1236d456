// surfbridge/src/tests/mock.rs
//
//! An in-process EGL driver for exercising the display without a GPU.

use crate::egl;
use crate::egl::types::EGLint;
use crate::platform::egl::ffi::{NativeConfig, NativeContext, NativeSurface, NativeWindow};
use crate::{EglFunctions, GLVersion};

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

const FIRST_CONFIG: usize = 0x100;
const FIRST_CONTEXT: usize = 0x1000;
const FIRST_SURFACE: usize = 0x2000;

/// An entry point the display called, with its arguments.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    ChooseConfig(Vec<EGLint>),
    CreateContext { config: NativeConfig, share: NativeContext, attributes: Vec<EGLint> },
    DestroyContext(NativeContext),
    MakeCurrent(NativeSurface, NativeContext),
    CreatePbufferSurface(NativeConfig, Vec<EGLint>),
    CreateWindowSurface(NativeConfig, NativeWindow),
    DestroySurface(NativeSurface),
    SwapBuffers(NativeSurface),
    SwapInterval(EGLint),
    Terminate,
}

#[derive(Clone, Debug)]
pub(crate) struct MockConfig {
    pub(crate) attributes: HashMap<EGLint, EGLint>,
}

impl MockConfig {
    pub(crate) fn new(config_id: EGLint, rgba: [EGLint; 4], depth: EGLint, stencil: EGLint)
                      -> MockConfig {
        let mut attributes = HashMap::new();
        let mut set = |name: u32, value: EGLint| {
            attributes.insert(name as EGLint, value);
        };
        set(egl::CONFIG_ID, config_id);
        set(egl::BUFFER_SIZE, rgba.iter().sum());
        set(egl::RED_SIZE, rgba[0]);
        set(egl::GREEN_SIZE, rgba[1]);
        set(egl::BLUE_SIZE, rgba[2]);
        set(egl::ALPHA_SIZE, rgba[3]);
        set(egl::DEPTH_SIZE, depth);
        set(egl::STENCIL_SIZE, stencil);
        set(egl::COLOR_BUFFER_TYPE, egl::RGB_BUFFER as EGLint);
        set(egl::SURFACE_TYPE, (egl::WINDOW_BIT | egl::PBUFFER_BIT | egl::PIXMAP_BIT) as EGLint);
        set(egl::RENDERABLE_TYPE, (egl::OPENGL_ES2_BIT | egl::OPENGL_ES3_BIT) as EGLint);
        set(egl::CONFIG_CAVEAT, egl::NONE as EGLint);
        set(egl::MAX_SWAP_INTERVAL, 1);
        set(egl::MIN_SWAP_INTERVAL, 0);
        set(egl::MATCH_NATIVE_PIXMAP, 0x1234);
        MockConfig { attributes }
    }

    pub(crate) fn rgba8_d24s8(config_id: EGLint) -> MockConfig {
        MockConfig::new(config_id, [8, 8, 8, 8], 24, 8)
    }

    pub(crate) fn with(mut self, name: u32, value: EGLint) -> MockConfig {
        self.attributes.insert(name as EGLint, value);
        self
    }

    fn get(&self, name: EGLint) -> EGLint {
        self.attributes.get(&name).copied().unwrap_or(0)
    }

    fn matches(&self, requested: &[EGLint]) -> bool {
        requested.chunks(2).take_while(|pair| pair[0] != egl::NONE as EGLint).all(|pair| {
            let (name, value) = (pair[0], pair[1]);
            let actual = self.get(name);
            match name as u32 {
                egl::RED_SIZE | egl::GREEN_SIZE | egl::BLUE_SIZE | egl::ALPHA_SIZE |
                egl::DEPTH_SIZE | egl::STENCIL_SIZE => actual >= value,
                egl::SURFACE_TYPE | egl::RENDERABLE_TYPE => actual & value == value,
                _ => actual == value,
            }
        })
    }
}

/// Everything the mock driver knows. Tests may poke at it directly.
pub(crate) struct MockState {
    pub(crate) version: GLVersion,
    pub(crate) extensions: HashSet<String>,
    pub(crate) configs: Vec<MockConfig>,
    pub(crate) calls: Vec<Call>,
    pub(crate) error: EGLint,
    /// Contexts asking for a higher ES version than this fail.
    pub(crate) max_context_version: GLVersion,
    pub(crate) fail_robust_contexts: bool,
    pub(crate) fail_create_context: bool,
    pub(crate) fail_make_current: bool,
    pub(crate) fail_pbuffer: bool,
    pub(crate) fail_swap_buffers: bool,
    pub(crate) live_contexts: HashSet<NativeContext>,
    pub(crate) surface_sizes: HashMap<NativeSurface, (EGLint, EGLint)>,
    pub(crate) current: HashMap<ThreadId, (NativeSurface, NativeContext)>,
    next_context: usize,
    next_surface: usize,
}

pub(crate) struct MockEgl {
    state: Mutex<MockState>,
}

impl MockEgl {
    /// An EGL 1.5 driver with one RGBA8/D24S8 config and surfaceless support.
    pub(crate) fn new() -> MockEgl {
        MockEgl {
            state: Mutex::new(MockState {
                version: GLVersion::new(1, 5),
                extensions: ["EGL_KHR_surfaceless_context"].iter().map(|s| s.to_string()).collect(),
                configs: vec![MockConfig::rgba8_d24s8(1)],
                calls: vec![],
                error: egl::SUCCESS as EGLint,
                max_context_version: GLVersion::new(3, 2),
                fail_robust_contexts: false,
                fail_create_context: false,
                fail_make_current: false,
                fail_pbuffer: false,
                fail_swap_buffers: false,
                live_contexts: HashSet::new(),
                surface_sizes: HashMap::new(),
                current: HashMap::new(),
                next_context: FIRST_CONTEXT,
                next_surface: FIRST_SURFACE,
            }),
        }
    }

    pub(crate) fn with_version(self, major: u8, minor: u8) -> MockEgl {
        self.state().version = GLVersion::new(major, minor);
        self
    }

    pub(crate) fn with_extensions(self, extensions: &[&str]) -> MockEgl {
        self.state().extensions = extensions.iter().map(|s| s.to_string()).collect();
        self
    }

    pub(crate) fn with_configs(self, configs: Vec<MockConfig>) -> MockEgl {
        self.state().configs = configs;
        self
    }

    pub(crate) fn state(&self) -> MutexGuard<MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub(crate) fn make_current_calls(&self) -> Vec<(NativeSurface, NativeContext)> {
        self.calls().into_iter().filter_map(|call| match call {
            Call::MakeCurrent(surface, context) => Some((surface, context)),
            _ => None,
        }).collect()
    }

    pub(crate) fn created_contexts(&self) -> Vec<Vec<EGLint>> {
        self.calls().into_iter().filter_map(|call| match call {
            Call::CreateContext { attributes, .. } => Some(attributes),
            _ => None,
        }).collect()
    }

    /// Creates a context and binds it natively, the way an embedder would.
    pub(crate) fn make_embedder_context_current(&self) -> NativeContext {
        let mut state = self.state();
        let context = NativeContext(state.next_context);
        state.next_context += 1;
        state.live_contexts.insert(context);
        state.current.insert(thread::current().id(), (NativeSurface::NONE, context));
        context
    }

    pub(crate) fn native_config(index: usize) -> NativeConfig {
        NativeConfig(FIRST_CONFIG + index)
    }
}

impl MockState {
    fn fail(&mut self, error: u32) {
        self.error = error as EGLint;
    }

    fn config(&self, config: NativeConfig) -> Option<&MockConfig> {
        config.0.checked_sub(FIRST_CONFIG).and_then(|index| self.configs.get(index))
    }

    fn new_surface(&mut self, size: (EGLint, EGLint)) -> NativeSurface {
        let surface = NativeSurface(self.next_surface);
        self.next_surface += 1;
        self.surface_sizes.insert(surface, size);
        surface
    }
}

fn attribute(attributes: &[EGLint], name: u32) -> Option<EGLint> {
    attributes.chunks(2)
              .take_while(|pair| pair[0] != egl::NONE as EGLint)
              .find(|pair| pair[0] == name as EGLint)
              .map(|pair| pair[1])
}

impl EglFunctions for MockEgl {
    fn version(&self) -> GLVersion {
        self.state().version
    }

    fn has_extension(&self, name: &str) -> bool {
        self.state().extensions.contains(name)
    }

    fn get_error(&self) -> EGLint {
        let mut state = self.state();
        let error = state.error;
        state.error = egl::SUCCESS as EGLint;
        error
    }

    fn choose_config(&self, attributes: &[EGLint], configs: &mut [NativeConfig])
                     -> Option<usize> {
        let mut state = self.state();
        state.calls.push(Call::ChooseConfig(attributes.to_vec()));
        let matching: Vec<NativeConfig> = state.configs
                                               .iter()
                                               .enumerate()
                                               .filter(|(_, config)| config.matches(attributes))
                                               .map(|(index, _)| MockEgl::native_config(index))
                                               .collect();
        if configs.is_empty() {
            return Some(matching.len());
        }
        let count = matching.len().min(configs.len());
        configs[..count].copy_from_slice(&matching[..count]);
        Some(count)
    }

    fn get_config_attrib(&self, config: NativeConfig, attribute: EGLint) -> Option<EGLint> {
        let mut state = self.state();
        match state.config(config) {
            Some(config) => Some(config.get(attribute)),
            None => {
                state.fail(egl::BAD_CONFIG);
                None
            }
        }
    }

    fn create_context(&self,
                      config: NativeConfig,
                      share_context: NativeContext,
                      attributes: &[EGLint])
                      -> NativeContext {
        let mut state = self.state();
        state.calls.push(Call::CreateContext {
            config,
            share: share_context,
            attributes: attributes.to_vec(),
        });

        let major = attribute(attributes, egl::CONTEXT_MAJOR_VERSION).unwrap_or(1);
        let minor = attribute(attributes, egl::CONTEXT_MINOR_VERSION).unwrap_or(0);
        let robust = attribute(attributes, egl::CONTEXT_OPENGL_RESET_NOTIFICATION_STRATEGY);
        if state.fail_create_context ||
                GLVersion::new(major as u8, minor as u8) > state.max_context_version {
            state.fail(egl::BAD_MATCH);
            return NativeContext::NONE;
        }
        if robust.is_some() && state.fail_robust_contexts {
            state.fail(egl::BAD_ATTRIBUTE);
            return NativeContext::NONE;
        }
        if !share_context.is_none() && !state.live_contexts.contains(&share_context) {
            state.fail(egl::BAD_CONTEXT);
            return NativeContext::NONE;
        }

        let context = NativeContext(state.next_context);
        state.next_context += 1;
        state.live_contexts.insert(context);
        context
    }

    fn destroy_context(&self, context: NativeContext) -> bool {
        let mut state = self.state();
        state.calls.push(Call::DestroyContext(context));
        if !state.live_contexts.remove(&context) {
            state.fail(egl::BAD_CONTEXT);
            return false;
        }
        true
    }

    fn make_current(&self, surface: NativeSurface, context: NativeContext) -> bool {
        let mut state = self.state();
        state.calls.push(Call::MakeCurrent(surface, context));
        if state.fail_make_current {
            state.fail(egl::BAD_ACCESS);
            return false;
        }
        if surface.is_none() && !context.is_none() &&
                !state.extensions.contains("EGL_KHR_surfaceless_context") {
            state.fail(egl::BAD_MATCH);
            return false;
        }
        if !context.is_none() && !state.live_contexts.contains(&context) {
            state.fail(egl::BAD_CONTEXT);
            return false;
        }
        state.current.insert(thread::current().id(), (surface, context));
        true
    }

    fn get_current_context(&self) -> NativeContext {
        self.state()
            .current
            .get(&thread::current().id())
            .map_or(NativeContext::NONE, |&(_, context)| context)
    }

    fn create_pbuffer_surface(&self, config: NativeConfig, attributes: &[EGLint])
                              -> NativeSurface {
        let mut state = self.state();
        state.calls.push(Call::CreatePbufferSurface(config, attributes.to_vec()));
        if state.fail_pbuffer || state.config(config).is_none() {
            state.fail(egl::BAD_CONFIG);
            return NativeSurface::NONE;
        }
        let width = attribute(attributes, egl::WIDTH).unwrap_or(0);
        let height = attribute(attributes, egl::HEIGHT).unwrap_or(0);
        state.new_surface((width, height))
    }

    fn create_window_surface(&self,
                             config: NativeConfig,
                             window: NativeWindow,
                             _: &[EGLint])
                             -> NativeSurface {
        let mut state = self.state();
        state.calls.push(Call::CreateWindowSurface(config, window));
        if window.is_none() {
            state.fail(egl::BAD_NATIVE_WINDOW);
            return NativeSurface::NONE;
        }
        state.new_surface((640, 480))
    }

    fn destroy_surface(&self, surface: NativeSurface) -> bool {
        let mut state = self.state();
        state.calls.push(Call::DestroySurface(surface));
        if state.surface_sizes.remove(&surface).is_none() {
            state.fail(egl::BAD_SURFACE);
            return false;
        }
        true
    }

    fn query_surface(&self, surface: NativeSurface, attribute: EGLint) -> Option<EGLint> {
        let state = self.state();
        let &(width, height) = state.surface_sizes.get(&surface)?;
        match attribute as u32 {
            egl::WIDTH => Some(width),
            egl::HEIGHT => Some(height),
            egl::SWAP_BEHAVIOR => Some(egl::BUFFER_PRESERVED as EGLint),
            _ => None,
        }
    }

    fn swap_buffers(&self, surface: NativeSurface) -> bool {
        let mut state = self.state();
        state.calls.push(Call::SwapBuffers(surface));
        if state.fail_swap_buffers {
            state.fail(egl::BAD_SURFACE);
            return false;
        }
        true
    }

    fn swap_interval(&self, interval: EGLint) -> bool {
        self.state().calls.push(Call::SwapInterval(interval));
        true
    }

    fn terminate(&self) -> bool {
        let mut state = self.state();
        state.calls.push(Call::Terminate);
        state.current.clear();
        true
    }
}
