//! Native glue
//!
//! Detours installed on the host camera, the host-memory implementations of
//! [`CameraHost`] and [`CameraControl`], and attach/detach.
//!
//! Detours never block and never fail: when the runtime is missing (or a
//! writer holds it) they call straight through to the original, and when an
//! original is missing they return a neutral value.

use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::LazyLock;

use glam::{Vec2, Vec3};
use parking_lot::RwLock;

use camrig_engine::HostGlobals;
use camrig_sdk::{
    names, CameraLayout, CameraManagerLayout, CanChangePerspectiveFn, Framework, GameCamera,
    GameObject, GetCameraAutoRotateModeFn, GetCameraMaxMaintainDistanceFn, GetCameraPositionFn,
    GetCameraTargetFn, GetZoomDeltaFn, HostBool, SetCameraLookAtFn, UpdateLookAtHeightOffsetFn,
    Vector3,
};

use super::engine::{CameraOverrideEngine, CameraView, OverrideConstants};
use super::host::{CameraControl, CameraHost, CameraSeed, ObjectRef};
use crate::conditions::{ConditionSets, HostConditionSets, HostConditions};
use crate::config::CamrigConfig;
use crate::gamedata::{Gamedata, GamedataError, ModuleScanner, SignatureResolver};
use crate::hooks::patch::write_bytes;
use crate::hooks::{
    resolve_address, HookDescriptor, HookError, HookTarget, InterceptionLayer, PatchDescriptor,
    PatchKey,
};
use crate::presets::Preset;
use crate::runtime::{take_runtime, with_runtime, Camrig};

/// Collision test call replaced by `xor al, al` (never colliding)
const COLLISION_PATCH: [u8; 5] = [0x30, 0xC0, 0x90, 0x90, 0x90];

/// Errors that abort an attach
#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("Gamedata error: {0}")]
    Gamedata(#[from] GamedataError),

    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    #[error("Camera manager not available")]
    NoCameraManager,

    #[error("World camera not available")]
    NoWorldCamera,
}

/// Typed storage for an original function pointer
struct Original<F> {
    address: AtomicUsize,
    _marker: PhantomData<F>,
}

impl<F: Copy> Original<F> {
    const fn new() -> Self {
        Self {
            address: AtomicUsize::new(0),
            _marker: PhantomData,
        }
    }

    fn set(&self, pointer: Option<*const ()>) {
        let address = pointer.map(|p| p as usize).unwrap_or(0);
        self.address.store(address, Ordering::Release);
    }

    fn clear(&self) {
        self.address.store(0, Ordering::Release);
    }

    fn get(&self) -> Option<F> {
        let address = self.address.load(Ordering::Acquire);
        // SAFETY: only ever set from a hook on an entry point of type F
        (address != 0).then(|| unsafe { std::mem::transmute_copy::<usize, F>(&address) })
    }
}

static SET_CAMERA_LOOK_AT: Original<SetCameraLookAtFn> = Original::new();
static GET_CAMERA_POSITION: Original<GetCameraPositionFn> = Original::new();
static GET_CAMERA_TARGET: Original<GetCameraTargetFn> = Original::new();
static CAN_CHANGE_PERSPECTIVE: Original<CanChangePerspectiveFn> = Original::new();
static GET_ZOOM_DELTA: Original<GetZoomDeltaFn> = Original::new();
static GET_CAMERA_AUTO_ROTATE_MODE: Original<GetCameraAutoRotateModeFn> = Original::new();
static GET_CAMERA_MAX_MAINTAIN_DISTANCE: Original<GetCameraMaxMaintainDistanceFn> =
    Original::new();
static UPDATE_LOOK_AT_HEIGHT_OFFSET: Original<UpdateLookAtHeightOffsetFn> = Original::new();

fn clear_originals() {
    SET_CAMERA_LOOK_AT.clear();
    GET_CAMERA_POSITION.clear();
    GET_CAMERA_TARGET.clear();
    CAN_CHANGE_PERSPECTIVE.clear();
    GET_ZOOM_DELTA.clear();
    GET_CAMERA_AUTO_ROTATE_MODE.clear();
    GET_CAMERA_MAX_MAINTAIN_DISTANCE.clear();
    UPDATE_LOOK_AT_HEIGHT_OFFSET.clear();
}

/// Where camera fields live for the current attach
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layouts {
    pub camera: CameraLayout,
    pub manager: CameraManagerLayout,
    /// Address of the camera manager instance
    pub camera_manager: usize,
}

static LAYOUTS: LazyLock<RwLock<Layouts>> = LazyLock::new(|| RwLock::new(Layouts::default()));

unsafe fn field<T: Copy>(base: usize, offset: usize) -> T {
    ((base + offset) as *const T).read_unaligned()
}

unsafe fn set_field<T>(base: usize, offset: usize, value: T) {
    ((base + offset) as *mut T).write_unaligned(value)
}

fn to_vec3(v: Vector3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn from_vec3(v: Vec3) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

impl Layouts {
    /// # Safety
    /// `camera_manager` must be zero or a live camera manager.
    unsafe fn world_camera(&self) -> Option<usize> {
        if self.camera_manager == 0 {
            return None;
        }
        let camera: usize = field(self.camera_manager, self.manager.world_camera);
        (camera != 0).then_some(camera)
    }

    /// Fields of `camera` the engine needs; rotation comes from the world camera
    unsafe fn view(&self, camera: usize) -> CameraView {
        let rotation_source = self.world_camera().unwrap_or(camera);
        CameraView {
            mode: field(camera, self.camera.mode),
            h_rotation: field(rotation_source, self.camera.current_h_rotation),
            max_zoom: field(camera, self.camera.max_zoom),
        }
    }
}

/// Camera layout with per-field overrides from the gamedata `offsets` section
/// (keys `GameCamera::<field>`)
pub fn camera_layout(resolver: &dyn SignatureResolver) -> CameraLayout {
    let mut layout = CameraLayout::default();
    let fields = [
        ("GameCamera::scene_position", &mut layout.scene_position),
        ("GameCamera::scene_look_at", &mut layout.scene_look_at),
        ("GameCamera::current_zoom", &mut layout.current_zoom),
        ("GameCamera::min_zoom", &mut layout.min_zoom),
        ("GameCamera::max_zoom", &mut layout.max_zoom),
        ("GameCamera::current_fov", &mut layout.current_fov),
        ("GameCamera::min_fov", &mut layout.min_fov),
        ("GameCamera::max_fov", &mut layout.max_fov),
        ("GameCamera::current_h_rotation", &mut layout.current_h_rotation),
        ("GameCamera::current_v_rotation", &mut layout.current_v_rotation),
        ("GameCamera::min_v_rotation", &mut layout.min_v_rotation),
        ("GameCamera::max_v_rotation", &mut layout.max_v_rotation),
        ("GameCamera::tilt", &mut layout.tilt),
        ("GameCamera::mode", &mut layout.mode),
        ("GameCamera::look_at_height_offset", &mut layout.look_at_height_offset),
    ];

    for (key, slot) in fields {
        match resolver.offset(key) {
            Ok(value) => match usize::try_from(value) {
                Ok(value) => *slot = value,
                Err(_) => tracing::warn!("Ignoring negative offset {} for '{}'", value, key),
            },
            Err(GamedataError::OffsetNotFound(_)) => {}
            Err(e) => tracing::warn!("Ignoring offset '{}': {}", key, e),
        }
    }

    layout
}

fn manager_layout(resolver: &dyn SignatureResolver) -> CameraManagerLayout {
    let mut layout = CameraManagerLayout::default();
    if let Ok(offset) = resolver.offset("CameraManager::world_camera") {
        if let Ok(offset) = usize::try_from(offset) {
            layout.world_camera = offset;
        }
    }
    layout
}

/// Replacement for the legacy-control maintain-distance site:
/// `mov rcx, rbx; call <max maintain distance>; jmp +0x27; nop x4`
pub fn legacy_patch_bytes(site: usize, function: usize) -> Result<Vec<u8>, HookError> {
    // The call ends 8 bytes into the site
    let rel = (function as i64).wrapping_sub(site as i64 + 8);
    let rel = i32::try_from(rel).map_err(|_| {
        HookError::DetourCreation(format!("call target {:#x} out of rel32 range", function))
    })?;

    let mut bytes = vec![0x48, 0x8B, 0xCB, 0xE8];
    bytes.extend_from_slice(&rel.to_le_bytes());
    bytes.extend_from_slice(&[0xEB, 0x27, 0x90, 0x90, 0x90, 0x90]);
    Ok(bytes)
}

// Detours

unsafe fn original_target(camera: *mut GameCamera) -> Option<ObjectRef> {
    GET_CAMERA_TARGET
        .get()
        .and_then(|original| ObjectRef::from_ptr(original(camera)))
}

unsafe extern "C" fn set_camera_look_at_detour(
    camera: *mut GameCamera,
    look_at: *mut Vector3,
    position: *mut Vector3,
    unused: *mut Vector3,
) {
    let pose = with_runtime(|rt| rt.engine().set_look_at(&rt.context())).flatten();
    if let Some(pose) = pose {
        if !look_at.is_null() {
            *look_at = from_vec3(pose.look_at);
        }
        if !position.is_null() {
            *position = from_vec3(pose.position);
        }
    }
    if let Some(original) = SET_CAMERA_LOOK_AT.get() {
        original(camera, look_at, position, unused);
    }
}

unsafe extern "C" fn get_camera_position_detour(
    camera: *mut GameCamera,
    target: *mut GameObject,
    position: *mut Vector3,
    swap_person: HostBool,
) {
    let call_original = move || {
        if let Some(original) = GET_CAMERA_POSITION.get() {
            original(camera, target, position, swap_person);
        }
    };

    if position.is_null() || camera.is_null() {
        call_original();
        return;
    }

    let handled = with_runtime(|rt| {
        let ctx = rt.context();
        let view = LAYOUTS.read().view(camera as usize);
        let result = rt.engine().camera_position(
            &ctx,
            &view,
            || rt.engine().camera_target(&ctx, || original_target(camera)),
            || {
                call_original();
                to_vec3(*position)
            },
        );
        *position = from_vec3(result);
    });

    if handled.is_none() {
        call_original();
    }
}

unsafe extern "C" fn get_camera_target_detour(camera: *mut GameCamera) -> *mut GameObject {
    with_runtime(|rt| rt.engine().camera_target(&rt.context(), || original_target(camera)))
        .unwrap_or_else(|| original_target(camera))
        .map(|target| target.as_ptr::<GameObject>())
        .unwrap_or(std::ptr::null_mut())
}

unsafe extern "C" fn can_change_perspective_detour(camera: *mut GameCamera) -> HostBool {
    match with_runtime(|rt| rt.engine().can_change_perspective(&rt.context())) {
        Some(allowed) => allowed as HostBool,
        None => CAN_CHANGE_PERSPECTIVE
            .get()
            .map(|original| original(camera))
            .unwrap_or(1),
    }
}

unsafe extern "C" fn get_zoom_delta_detour(camera: *mut GameCamera) -> f32 {
    let original = move || {
        GET_ZOOM_DELTA
            .get()
            .map(|original| original(camera))
            .unwrap_or(Preset::default().zoom_delta)
    };
    with_runtime(|rt| rt.engine().zoom_delta(&rt.context(), original)).unwrap_or_else(original)
}

unsafe extern "C" fn get_camera_auto_rotate_mode_detour(
    camera: *mut GameCamera,
    framework: *mut Framework,
) -> u8 {
    let original = move || {
        GET_CAMERA_AUTO_ROTATE_MODE
            .get()
            .map(|original| original(camera, framework))
            .unwrap_or(0)
    };
    with_runtime(|rt| rt.engine().auto_rotate_mode(&rt.context(), original))
        .unwrap_or_else(original)
}

unsafe extern "C" fn get_camera_max_maintain_distance_detour(camera: *mut GameCamera) -> f32 {
    let original = move || {
        GET_CAMERA_MAX_MAINTAIN_DISTANCE
            .get()
            .map(|original| original(camera))
            .unwrap_or(0.0)
    };

    if camera.is_null() {
        return original();
    }

    with_runtime(|rt| {
        let view = LAYOUTS.read().view(camera as usize);
        rt.engine()
            .max_maintain_distance(&rt.context(), &view, original)
    })
    .unwrap_or_else(original)
}

unsafe extern "C" fn update_look_at_height_offset_detour(
    camera: *mut GameCamera,
    object: *mut GameObject,
    zero: HostBool,
) -> HostBool {
    let original = move || {
        UPDATE_LOOK_AT_HEIGHT_OFFSET
            .get()
            .map(|original| original(camera, object, zero) != 0)
            .unwrap_or(false)
    };

    if camera.is_null() {
        return original() as HostBool;
    }

    let offset = LAYOUTS.read().camera.look_at_height_offset;
    let updated = with_runtime(|rt| {
        rt.engine().update_look_at_height_offset(
            &rt.context(),
            ObjectRef::from_ptr(object),
            zero != 0,
            original,
            |value| set_field(camera as usize, offset, value),
        )
    })
    .unwrap_or_else(original);

    updated as HostBool
}

/// World queries through the loader callback table
pub struct NativeHost {
    host: &'static HostGlobals,
    sets: HostConditionSets<'static>,
}

impl NativeHost {
    pub fn new(host: &'static HostGlobals) -> Self {
        Self {
            host,
            sets: HostConditionSets::new(host),
        }
    }
}

fn object_ref(object: Option<NonNull<GameObject>>) -> Option<ObjectRef> {
    object.map(|o| ObjectRef(o.as_ptr() as usize))
}

impl CameraHost for NativeHost {
    fn local_player(&self) -> Option<ObjectRef> {
        object_ref(self.host.local_player())
    }

    fn focus_target(&self) -> Option<ObjectRef> {
        object_ref(self.host.focus_target())
    }

    fn soft_target(&self) -> Option<ObjectRef> {
        object_ref(self.host.soft_target())
    }

    fn hard_target(&self) -> Option<ObjectRef> {
        object_ref(self.host.hard_target())
    }

    fn conditions(&self) -> HostConditions {
        HostConditions::current(self.host)
    }

    fn bone_position(&self, object: ObjectRef, bone: i32) -> Option<Vec3> {
        let object = NonNull::new(object.as_ptr::<GameObject>())?;
        self.host.bone_position(object, bone).map(to_vec3)
    }

    fn condition_sets(&self) -> &dyn ConditionSets {
        &self.sets
    }
}

/// Live camera control over host memory
///
/// Owns the interception layer; dropping it restores every hook and patch.
pub struct NativeCamera {
    layer: InterceptionLayer,
    collision: Option<PatchKey>,
    layouts: Layouts,
    /// Address of the static FoV step, 0 when unavailable
    fov_delta: usize,
    /// Address of the movement-disable reference count, 0 when unavailable
    force_disable_movement: usize,
    host: &'static HostGlobals,
}

impl NativeCamera {
    fn world_camera(&self) -> Option<usize> {
        unsafe { self.layouts.world_camera() }
    }

    /// Look-at height the host computes for the local player, leaving the
    /// camera field untouched
    unsafe fn default_look_at_height_offset(&self, camera: usize) -> f32 {
        let offset = self.layouts.camera.look_at_height_offset;
        let (Some(update), Some(player)) =
            (UPDATE_LOOK_AT_HEIGHT_OFFSET.get(), self.host.local_player())
        else {
            return field(camera, offset);
        };

        let previous: f32 = field(camera, offset);
        update(camera as *mut GameCamera, player.as_ptr(), 0);
        let value = field(camera, offset);
        set_field(camera, offset, previous);
        value
    }
}

impl CameraControl for NativeCamera {
    fn snapshot(&self) -> Option<Preset> {
        let camera = self.world_camera()?;
        let l = &self.layouts.camera;
        let defaults = Preset::default();

        unsafe {
            Some(Preset {
                name: "Default".to_string(),
                start_zoom: field(camera, l.current_zoom),
                min_zoom: field(camera, l.min_zoom),
                max_zoom: field(camera, l.max_zoom),
                zoom_delta: GET_ZOOM_DELTA
                    .get()
                    .map(|original| original(camera as *mut GameCamera))
                    .unwrap_or(defaults.zoom_delta),
                start_fov: field(camera, l.current_fov),
                min_fov: field(camera, l.min_fov),
                max_fov: field(camera, l.max_fov),
                fov_delta: if self.fov_delta != 0 {
                    field(self.fov_delta, 0)
                } else {
                    defaults.fov_delta
                },
                min_v_rotation: field(camera, l.min_v_rotation),
                max_v_rotation: field(camera, l.max_v_rotation),
                tilt: field(camera, l.tilt),
                look_at_height_offset: self.default_look_at_height_offset(camera),
                ..defaults
            })
        }
    }

    fn apply_preset(&mut self, preset: &Preset, logging_in: bool) {
        let Some(camera) = self.world_camera() else {
            tracing::warn!("Cannot apply preset '{}': no camera", preset.name);
            return;
        };
        let l = self.layouts.camera;

        unsafe {
            set_field(camera, l.min_zoom, preset.min_zoom);
            set_field(camera, l.max_zoom, preset.max_zoom);
            set_field(camera, l.min_fov, preset.min_fov);
            set_field(camera, l.max_fov, preset.max_fov);
            set_field(camera, l.min_v_rotation, preset.min_v_rotation);
            set_field(camera, l.max_v_rotation, preset.max_v_rotation);
            set_field(camera, l.tilt, preset.tilt);

            if !logging_in || preset.use_start_on_login {
                if preset.use_start_zoom {
                    set_field(camera, l.current_zoom, preset.start_zoom);
                }
                if preset.use_start_fov {
                    set_field(camera, l.current_fov, preset.start_fov);
                }
            }

            if self.fov_delta != 0 {
                if let Err(e) = write_bytes(self.fov_delta as *mut u8, &preset.fov_delta.to_ne_bytes())
                {
                    tracing::error!("Failed to write FoV delta: {}", e);
                }
            }
        }
    }

    fn set_zoom(&mut self, zoom: f32) -> bool {
        let Some(camera) = self.world_camera() else {
            return false;
        };
        unsafe { set_field(camera, self.layouts.camera.current_zoom, zoom) };
        true
    }

    fn set_fov(&mut self, fov: f32) -> bool {
        let Some(camera) = self.world_camera() else {
            return false;
        };
        unsafe { set_field(camera, self.layouts.camera.current_fov, fov) };
        true
    }

    fn seed(&self) -> Option<CameraSeed> {
        let camera = self.world_camera()?;
        let l = &self.layouts.camera;

        unsafe {
            Some(CameraSeed {
                position: to_vec3(field(camera, l.scene_position)),
                rotation: Vec2::new(
                    field(camera, l.current_h_rotation),
                    field(camera, l.current_v_rotation),
                ),
            })
        }
    }

    fn adjust_movement_lock(&mut self, delta: i32) {
        if self.force_disable_movement == 0 {
            return;
        }
        unsafe {
            let count: i32 = field(self.force_disable_movement, 0);
            set_field(self.force_disable_movement, 0, count.saturating_add(delta).max(0));
        }
    }

    fn set_collision_disabled(&mut self, disabled: bool) -> bool {
        let Some(key) = self.collision else {
            return false;
        };

        match self.layer.toggle_patch(key, disabled) {
            Ok(before) => before,
            Err(e) => {
                tracing::error!("Failed to toggle camera collision: {}", e);
                self.layer.is_patch_applied(key)
            }
        }
    }

    fn collision_disabled(&self) -> bool {
        self.collision
            .map(|key| self.layer.is_patch_applied(key))
            .unwrap_or(false)
    }
}

fn install<F: Copy>(
    layer: &mut InterceptionLayer,
    resolver: &dyn SignatureResolver,
    descriptor: HookDescriptor,
    original: &Original<F>,
) -> Result<(), HookError> {
    let key = unsafe { layer.install(resolver, &descriptor)? };
    original.set(layer.original(key));
    Ok(())
}

fn vtable_hook(table: usize, index: &'static str, detour: *const ()) -> HookDescriptor {
    HookDescriptor {
        name: index,
        target: HookTarget::VTable { table, index },
        detour,
    }
}

fn function_hook(name: &'static str, detour: *const ()) -> HookDescriptor {
    HookDescriptor {
        name,
        target: HookTarget::Signature(name),
        detour,
    }
}

/// Resolve everything against the host module, install the hooks and patches
/// and build the runtime
///
/// # Safety
/// The host module must be mapped, and no host thread may be inside a camera
/// entry point while hooks are written.
#[tracing::instrument(skip_all)]
pub unsafe fn attach(
    host: &'static HostGlobals,
    gamedata: &Gamedata,
    config: CamrigConfig,
) -> Result<Camrig, AttachError> {
    let scanner = ModuleScanner::new(gamedata, host.module.base_ptr(), host.module.size);
    attach_with(host, &scanner, config)
}

/// [`attach`] against any resolver
///
/// On failure every hook installed so far is removed again.
///
/// # Safety
/// See [`attach`]; every address the resolver yields must be live host memory.
pub unsafe fn attach_with(
    host: &'static HostGlobals,
    resolver: &dyn SignatureResolver,
    config: CamrigConfig,
) -> Result<Camrig, AttachError> {
    let result = install_all(host, resolver, config);
    if let Err(e) = &result {
        tracing::error!("Attach failed: {}", e);
        clear_originals();
        *LAYOUTS.write() = Layouts::default();
    }
    result
}

unsafe fn install_all(
    host: &'static HostGlobals,
    resolver: &dyn SignatureResolver,
    config: CamrigConfig,
) -> Result<Camrig, AttachError> {
    let camera_manager = match host.camera_manager_ptr() {
        Some(ptr) => ptr as usize,
        None => {
            let address = resolver.resolve(names::CAMERA_MANAGER)?;
            host.set_camera_manager(address as *mut _);
            address
        }
    };
    if camera_manager == 0 {
        return Err(AttachError::NoCameraManager);
    }

    let layouts = Layouts {
        camera: camera_layout(resolver),
        manager: manager_layout(resolver),
        camera_manager,
    };
    let world_camera = layouts.world_camera().ok_or(AttachError::NoWorldCamera)?;
    let vtable: usize = field(world_camera, 0);
    if vtable == 0 {
        return Err(AttachError::NoWorldCamera);
    }
    *LAYOUTS.write() = layouts;

    let fov_delta = resolver.resolve(names::FOV_DELTA)?;
    let force_disable_movement = resolver.resolve(names::FORCE_DISABLE_MOVEMENT)?;

    let mut layer = InterceptionLayer::new();

    install(
        &mut layer,
        resolver,
        vtable_hook(vtable, names::VF_SET_CAMERA_LOOK_AT, set_camera_look_at_detour as *const ()),
        &SET_CAMERA_LOOK_AT,
    )?;
    install(
        &mut layer,
        resolver,
        vtable_hook(vtable, names::VF_GET_CAMERA_POSITION, get_camera_position_detour as *const ()),
        &GET_CAMERA_POSITION,
    )?;
    install(
        &mut layer,
        resolver,
        vtable_hook(vtable, names::VF_GET_CAMERA_TARGET, get_camera_target_detour as *const ()),
        &GET_CAMERA_TARGET,
    )?;
    install(
        &mut layer,
        resolver,
        vtable_hook(
            vtable,
            names::VF_CAN_CHANGE_PERSPECTIVE,
            can_change_perspective_detour as *const (),
        ),
        &CAN_CHANGE_PERSPECTIVE,
    )?;
    install(
        &mut layer,
        resolver,
        vtable_hook(vtable, names::VF_GET_ZOOM_DELTA, get_zoom_delta_detour as *const ()),
        &GET_ZOOM_DELTA,
    )?;

    // Resolved before hooking; the legacy patch calls into the hooked entry
    let max_distance_fn = resolver.resolve(names::GET_CAMERA_MAX_MAINTAIN_DISTANCE)?;

    install(
        &mut layer,
        resolver,
        function_hook(
            names::GET_CAMERA_AUTO_ROTATE_MODE,
            get_camera_auto_rotate_mode_detour as *const (),
        ),
        &GET_CAMERA_AUTO_ROTATE_MODE,
    )?;
    install(
        &mut layer,
        resolver,
        function_hook(
            names::GET_CAMERA_MAX_MAINTAIN_DISTANCE,
            get_camera_max_maintain_distance_detour as *const (),
        ),
        &GET_CAMERA_MAX_MAINTAIN_DISTANCE,
    )?;
    install(
        &mut layer,
        resolver,
        function_hook(
            names::UPDATE_LOOK_AT_HEIGHT_OFFSET,
            update_look_at_height_offset_detour as *const (),
        ),
        &UPDATE_LOOK_AT_HEIGHT_OFFSET,
    )?;

    let collision = install_patches(
        &mut layer,
        resolver,
        config.enable_camera_no_clippy,
        max_distance_fn,
    )?;

    tracing::info!(
        "Installed {} hooks ({} optional features disabled)",
        layer.hook_count(),
        layer.degraded().len()
    );

    let control = NativeCamera {
        layer,
        collision,
        layouts,
        fov_delta,
        force_disable_movement,
        host,
    };

    Ok(Camrig::new(
        config,
        CameraOverrideEngine::new(OverrideConstants::default()),
        Box::new(NativeHost::new(host)),
        Box::new(control),
    ))
}

/// Collision patch (required) and legacy maintain-distance patch (optional)
///
/// Returns the collision patch key.
unsafe fn install_patches(
    layer: &mut InterceptionLayer,
    resolver: &dyn SignatureResolver,
    collision_disabled: bool,
    max_distance_fn: usize,
) -> Result<Option<PatchKey>, HookError> {
    let collision = layer.add_patch(
        resolver,
        PatchDescriptor {
            name: names::CAMERA_COLLISION,
            target: HookTarget::Signature(names::CAMERA_COLLISION),
            bytes: COLLISION_PATCH.to_vec(),
            required: true,
            enabled: collision_disabled,
        },
    )?;

    let legacy = resolve_address(resolver, &HookTarget::Signature(names::LEGACY_MAINTAIN_DISTANCE))
        .and_then(|site| Ok((site, legacy_patch_bytes(site, max_distance_fn)?)));
    match legacy {
        Ok((site, bytes)) => {
            layer.add_patch(
                resolver,
                PatchDescriptor {
                    name: names::LEGACY_MAINTAIN_DISTANCE,
                    target: HookTarget::Address(site),
                    bytes,
                    required: false,
                    enabled: true,
                },
            )?;
        }
        Err(e) => layer.mark_degraded(names::LEGACY_MAINTAIN_DISTANCE, &e),
    }

    Ok(collision)
}

/// Restore the camera, remove every hook and patch, drop the runtime
pub fn detach() {
    if let Some(mut camrig) = take_runtime() {
        camrig.detach();
        // Dropping the runtime drops the interception layer
        drop(camrig);
        tracing::info!("Camera hooks removed");
    }
    clear_originals();
    *LAYOUTS.write() = Layouts::default();
}
