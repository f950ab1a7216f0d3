//! Main viewer application: wgpu stage rendering with egui studio panels

use crate::config::ViewerConfig;
use crate::history::SceneState;
use crate::hooks::LoggingHooks;
use crate::host::SceneHost;
use crate::input::{map_shortcut, HoldRepeat, ViewerCommand};
use crate::panels::{loading_overlay, status_bar, ControlBar, PanelAction, StagePanel, WardrobePanel};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use studio_catalog::Catalog;
use studio_render::RenderContext;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{ModifiersState, PhysicalKey};
use winit::window::{Window, WindowId};

/// Radians of orbit per pixel of drag
const ORBIT_SENSITIVITY: f32 = 0.01;

/// Run the studio viewer on `model`, starting from the catalog defaults or
/// the given backdrop id
pub fn run(model: Option<String>, config: ViewerConfig, backdrop: Option<String>) -> Result<()> {
    let catalog = Catalog::builtin()?;
    let mut initial = SceneState::initial(&catalog, config.scene.reflection, config.scene.grid);
    if let Some(id) = &backdrop {
        initial.backdrop = catalog.require_backdrop(id)?.clone();
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(catalog, initial, config, model);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StudioTab {
    Stage,
    Wardrobe,
}

struct ViewerApp {
    catalog: Catalog,
    initial: SceneState,
    config: ViewerConfig,
    model: Option<String>,

    window: Option<Arc<Window>>,
    render_context: Option<RenderContext>,
    host: Option<SceneHost>,

    // Input state
    modifiers: ModifiersState,
    cursor_in_window: bool,
    last_mouse_pos: Option<(f64, f64)>,
    orbiting: bool,
    hold: HoldRepeat,

    // egui state
    egui_ctx: egui::Context,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,

    // Panel state
    tab: StudioTab,
    stage_panel: StagePanel,
    wardrobe_panel: WardrobePanel,
    control_bar: ControlBar,

    last_frame_time: Instant,
}

impl ViewerApp {
    fn new(catalog: Catalog, initial: SceneState, config: ViewerConfig, model: Option<String>) -> Self {
        Self {
            catalog,
            initial,
            config,
            model,
            window: None,
            render_context: None,
            host: None,
            modifiers: ModifiersState::empty(),
            cursor_in_window: false,
            last_mouse_pos: None,
            orbiting: false,
            hold: HoldRepeat::new(),
            egui_ctx: egui::Context::default(),
            egui_winit: None,
            egui_renderer: None,
            tab: StudioTab::Stage,
            stage_panel: StagePanel::new(),
            wardrobe_panel: WardrobePanel::new(),
            control_bar: ControlBar::new(),
            last_frame_time: Instant::now(),
        }
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("Failed to create studio window")?,
        );
        self.window = Some(window.clone());

        let render_context = pollster::block_on(RenderContext::new(window.clone()))
            .context("Failed to initialize studio render context")?;

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &render_context.device,
            render_context.format(),
            None,
            1,
            false,
        );

        let hooks = LoggingHooks::new(Some(self.config.capture.output_dir.clone()));
        let mut host = SceneHost::new(
            &render_context.device,
            &render_context.queue,
            render_context.format(),
            render_context.config.width,
            render_context.config.height,
            self.initial.clone(),
            &self.config,
            Box::new(hooks),
        );
        match &self.model {
            Some(source) => host.load_subject(source),
            None => log::warn!("No subject model given; showing an empty stage"),
        }

        self.render_context = Some(render_context);
        self.host = Some(host);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);

        Ok(())
    }

    fn run_command(&mut self, command: ViewerCommand) {
        let (Some(context), Some(host)) = (&self.render_context, &mut self.host) else {
            return;
        };
        match command {
            ViewerCommand::Undo => host.undo(&context.device, &context.queue),
            ViewerCommand::Redo => host.redo(&context.device, &context.queue),
            ViewerCommand::Rotate(direction) => host.runtime_mut().push_impulse(direction.impulse()),
        }
    }

    fn render(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame_time).as_secs_f32().min(0.1);
        self.last_frame_time = now;

        let hovered = self.cursor_in_window && !self.egui_ctx.is_pointer_over_area();
        let output = {
            let (Some(context), Some(host)) = (&self.render_context, &mut self.host) else {
                return;
            };

            for impulse in self.hold.tick(dt) {
                host.runtime_mut().push_impulse(impulse);
            }
            host.runtime_mut().set_hovered(hovered);
            host.frame(&context.device, &context.queue, dt);

            match context.surface.get_current_texture() {
                Ok(output) => output,
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => return,
                Err(e) => {
                    log::error!("Surface error: {:?}", e);
                    return;
                }
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if let (Some(context), Some(host)) = (&self.render_context, &self.host) {
            host.render(&context.device, &context.queue, &view);
        }

        let actions = self.render_egui(&view);
        self.apply_actions(actions);

        output.present();
    }

    fn render_egui(&mut self, target_view: &wgpu::TextureView) -> Vec<PanelAction> {
        let mut actions = Vec::new();

        // Extract references to disjoint fields to satisfy the borrow checker
        let Some(window) = self.window.clone() else {
            return actions;
        };
        let (Some(context), Some(egui_winit), Some(host)) =
            (&self.render_context, &mut self.egui_winit, &self.host)
        else {
            return actions;
        };
        let Some(mut egui_renderer) = self.egui_renderer.take() else {
            return actions;
        };

        let raw_input = egui_winit.take_egui_input(&window);

        let catalog = &self.catalog;
        let tab = &mut self.tab;
        let stage_panel = &mut self.stage_panel;
        let wardrobe_panel = &mut self.wardrobe_panel;
        let control_bar = &mut self.control_bar;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
                status_bar(ui, host.runtime(), host.lod(), host.compositor());
            });

            egui::TopBottomPanel::bottom("control_bar").show(ctx, |ui| {
                control_bar.ui(ui, host.runtime(), host.load_state().is_ready(), &mut actions);
            });

            egui::SidePanel::right("studio_panel")
                .default_width(300.0)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.selectable_value(&mut *tab, StudioTab::Stage, "Stage");
                        ui.selectable_value(&mut *tab, StudioTab::Wardrobe, "Wardrobe");
                    });
                    ui.separator();
                    match *tab {
                        StudioTab::Stage => stage_panel.ui(ui, catalog, host.runtime(), &mut actions),
                        StudioTab::Wardrobe => {
                            wardrobe_panel.ui(ui, catalog, host.runtime(), &mut actions)
                        }
                    }
                });

            loading_overlay(ctx, host.load_state());
        });

        egui_winit.handle_platform_output(&window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [context.config.width, context.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui Encoder"),
            });

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(&context.device, &context.queue, *id, image_delta);
        }

        egui_renderer.update_buffers(
            &context.device,
            &context.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        context.queue.submit(std::iter::once(encoder.finish()));

        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        self.egui_renderer = Some(egui_renderer);
        actions
    }

    /// Apply panel requests collected during the egui pass
    fn apply_actions(&mut self, actions: Vec<PanelAction>) {
        let (Some(context), Some(host)) = (&self.render_context, &mut self.host) else {
            return;
        };
        let (device, queue) = (&context.device, &context.queue);

        for action in actions {
            match action {
                PanelAction::Edit(update) => host.user_edit(device, queue, update),
                PanelAction::PreviewReflection(level) => host.runtime_mut().preview_reflection(level),
                PanelAction::PreviewGrid(level) => host.runtime_mut().preview_grid(level),
                PanelAction::SetBlur(px) => host.runtime_mut().set_blur(px),
                PanelAction::Undo => host.undo(device, queue),
                PanelAction::Redo => host.redo(device, queue),
                PanelAction::Capture => {
                    if let Err(e) = host.capture_frame(device, queue) {
                        log::error!("Capture failed: {}", e);
                    }
                }
                PanelAction::Import(path) => host.import_backdrop(device, queue, &path, None),
                PanelAction::Impulse(amount) => host.runtime_mut().push_impulse(amount),
                PanelAction::Hold(direction) => self.hold.press(direction),
            }
        }
    }

    fn shutdown(&mut self) {
        if let (Some(host), Some(context)) = (self.host.take(), &self.render_context) {
            host.teardown(&context.device, &context.queue);
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.initialize(event_loop) {
                log::error!("Failed to initialize studio viewer: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Track modifier keys
        if let WindowEvent::ModifiersChanged(mods) = &event {
            self.modifiers = mods.state();
        }

        // A release anywhere ends a held rotation or drag, even over a panel
        if let WindowEvent::MouseInput {
            state: ElementState::Released,
            ..
        } = event
        {
            self.hold.release();
            self.orbiting = false;
        }

        // Studio shortcuts, unless a text field has focus
        if let WindowEvent::KeyboardInput { event: ref key_event, .. } = event {
            if key_event.state == ElementState::Pressed && !self.egui_ctx.wants_keyboard_input() {
                if let PhysicalKey::Code(code) = key_event.physical_key {
                    let mac = cfg!(target_os = "macos");
                    match map_shortcut(code, self.modifiers, mac) {
                        Some(ViewerCommand::Rotate(direction)) => {
                            self.run_command(ViewerCommand::Rotate(direction));
                            return;
                        }
                        Some(command) if !key_event.repeat => {
                            self.run_command(command);
                            return;
                        }
                        _ => {}
                    }
                }
            }
        }

        // Let egui handle the event first
        if let Some(egui_winit) = &mut self.egui_winit {
            if let Some(window) = &self.window {
                let response = egui_winit.on_window_event(window, &event);
                if response.consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(context) = &mut self.render_context {
                    if context.resize(new_size) {
                        if let Some(host) = &mut self.host {
                            host.resize(&context.device, new_size.width, new_size.height);
                        }
                    }
                }
            }

            WindowEvent::DroppedFile(path) => {
                if let (Some(context), Some(host)) = (&self.render_context, &mut self.host) {
                    host.import_backdrop(&context.device, &context.queue, &path, None);
                }
            }

            WindowEvent::CursorEntered { .. } => {
                self.cursor_in_window = true;
            }

            WindowEvent::CursorLeft { .. } => {
                self.cursor_in_window = false;
                self.last_mouse_pos = None;
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.orbiting =
                    state == ElementState::Pressed && !self.egui_ctx.is_pointer_over_area();
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_in_window = true;
                if let (Some((last_x, last_y)), Some(host)) = (self.last_mouse_pos, &mut self.host) {
                    if self.orbiting {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;
                        host.camera_mut()
                            .orbit(-dx * ORBIT_SENSITIVITY, -dy * ORBIT_SENSITIVITY);
                    }
                }
                self.last_mouse_pos = Some((position.x, position.y));
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                if let Some(host) = &mut self.host {
                    host.camera_mut().zoom(scroll);
                }
            }

            WindowEvent::RedrawRequested => {
                self.render();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
