use std::io::Write;

use belay_core::display::format_mm_ss;
use belay_core::{BeepRequest, Mode, SettingsExt, TimerSettings, TimerSink};
use belay_types::{
    MAX_CLIMB_MINUTES, MAX_TRANSITION_SECS, MIN_CLIMB_MINUTES, MIN_TRANSITION_SECS,
};
use clap::ValueEnum;
use tracing::info;

use crate::host::{Host, HostCommand, Reply, Setting};
use crate::keys::KeyAction;

/// Names accepted by `set <key> <value>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SettingKey {
    Mode,
    Climb,
    Transition,
    Sound,
    Flash,
}

impl Setting {
    pub fn parse(key: SettingKey, value: &str) -> Result<Self, String> {
        match key {
            SettingKey::Mode => value.parse().map(Setting::Mode),
            SettingKey::Climb => parse_number(value, "climb minutes").map(Setting::ClimbMinutes),
            SettingKey::Transition => {
                parse_number(value, "transition seconds").map(Setting::TransitionSecs)
            }
            SettingKey::Sound => parse_switch(value).map(Setting::Sound),
            SettingKey::Flash => parse_switch(value).map(Setting::Flash),
        }
    }
}

fn parse_number(value: &str, what: &str) -> Result<u32, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("invalid {what}: '{value}'"))
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(format!("expected on or off, got '{value}'")),
    }
}

pub fn dispatch<W: Write>(host: &mut Host<W>, command: HostCommand) -> Reply {
    match command {
        HostCommand::Start {
            mode,
            climb_minutes,
            transition_secs,
        } => start(host, mode, climb_minutes, transition_secs),
        HostCommand::Pause => pause(host),
        HostCommand::Resume => resume(host),
        HostCommand::Toggle => toggle(host),
        HostCommand::Stop => stop(host),
        HostCommand::Status => status(host),
        HostCommand::Set(setting) => set(host, setting),
        HostCommand::Config => show_config(host),
        HostCommand::TestBeep => test_beep(host),
        HostCommand::Key(action) => key(host, action),
        HostCommand::Shutdown => Ok("quitting...".to_string()),
    }
}

/// Start from the presets, optionally overriding them first
pub fn start<W: Write>(
    host: &mut Host<W>,
    mode: Option<Mode>,
    climb_minutes: Option<u32>,
    transition_secs: Option<u32>,
) -> Reply {
    if mode.is_some() || climb_minutes.is_some() || transition_secs.is_some() {
        host.update_settings(|s| {
            if let Some(mode) = mode {
                s.mode = mode;
            }
            if let Some(minutes) = climb_minutes {
                s.set_climb_minutes(minutes);
            }
            if let Some(secs) = transition_secs {
                s.set_transition_secs(secs);
            }
        });
    }
    host.start_run();

    let s = host.settings();
    let mut reply = format!("{} started: climb {}", s.mode, format_mm_ss(s.climb_duration_ms()));
    if s.mode.is_rotation() {
        reply.push_str(&format!(
            ", transition {}",
            format_mm_ss(s.transition_duration_ms())
        ));
    }
    Ok(reply)
}

pub fn pause<W: Write>(host: &mut Host<W>) -> Reply {
    if !host.engine().phase().is_running() {
        return Err("nothing is running".to_string());
    }
    host.engine_mut().pause();
    Ok(format!("paused at {}", format_mm_ss(host.engine().remaining_ms())))
}

pub fn resume<W: Write>(host: &mut Host<W>) -> Reply {
    if !host.engine().is_paused() {
        return Err("not paused".to_string());
    }
    host.engine_mut().resume();
    Ok("resumed".to_string())
}

pub fn toggle<W: Write>(host: &mut Host<W>) -> Reply {
    if host.engine().is_paused() {
        resume(host)
    } else {
        pause(host)
    }
}

pub fn stop<W: Write>(host: &mut Host<W>) -> Reply {
    host.engine_mut().stop();
    Ok("stopped".to_string())
}

pub fn status<W: Write>(host: &Host<W>) -> Reply {
    let engine = host.engine();
    Ok(format!(
        "phase={} mode={} round={} remaining={} ({} ms)",
        engine.phase(),
        engine.mode(),
        engine.round(),
        format_mm_ss(engine.remaining_ms()),
        engine.remaining_ms()
    ))
}

pub fn set<W: Write>(host: &mut Host<W>, setting: Setting) -> Reply {
    let phase = host.engine().phase();
    match setting {
        Setting::Mode(mode) => {
            let stopped = !phase.is_idle() && mode != host.engine().mode();
            if stopped {
                host.engine_mut().stop();
            }
            host.update_settings(|s| s.mode = mode);
            info!(%mode, stopped, "mode changed");
            Ok(if stopped {
                format!("mode set to {mode} (run stopped)")
            } else {
                format!("mode set to {mode}")
            })
        }
        Setting::ClimbMinutes(_) | Setting::TransitionSecs(_) if phase.is_running() => {
            Err("cannot change durations while running; pause or stop first".to_string())
        }
        Setting::ClimbMinutes(minutes) => {
            host.update_settings(|s| s.set_climb_minutes(minutes));
            Ok(format!(
                "climb set to {} min ({MIN_CLIMB_MINUTES}-{MAX_CLIMB_MINUTES})",
                host.settings().climb_minutes
            ))
        }
        Setting::TransitionSecs(secs) => {
            host.update_settings(|s| s.set_transition_secs(secs));
            Ok(format!(
                "transition set to {} s ({MIN_TRANSITION_SECS}-{MAX_TRANSITION_SECS})",
                host.settings().transition_secs
            ))
        }
        Setting::Sound(on) => {
            host.update_settings(|s| s.sound_on = on);
            Ok(format!("sound {}", on_off(on)))
        }
        Setting::Flash(on) => {
            host.update_settings(|s| s.flash_on = on);
            Ok(format!("flash {}", on_off(on)))
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

pub fn show_config<W: Write>(host: &Host<W>) -> Reply {
    let s = host.settings();
    let path = TimerSettings::config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unavailable)".to_string());
    Ok(format!(
        "config file: {path}\n\
         mode:          {}\n\
         climb:         {} min\n\
         transition:    {} s\n\
         sound:         {}\n\
         flash:         {}\n\
         lead window:   {} ms\n\
         frame pacing:  {} ms",
        s.mode,
        s.climb_minutes,
        s.transition_secs,
        on_off(s.sound_on),
        on_off(s.flash_on),
        s.lead_window_ms,
        s.frame_interval_ms,
    ))
}

pub fn test_beep<W: Write>(host: &mut Host<W>) -> Reply {
    if !host.settings().cues_audible() {
        return Err("sound is off".to_string());
    }
    host.engine_mut()
        .sink_mut()
        .play_beep(BeepRequest::DEFAULT)
        .map(|()| "beep".to_string())
        .map_err(|e| e.to_string())
}

pub fn key<W: Write>(host: &mut Host<W>, action: KeyAction) -> Reply {
    match action {
        KeyAction::StartOrToggle if host.engine().phase().is_idle() => start(host, None, None, None),
        KeyAction::StartOrToggle => toggle(host),
        KeyAction::Stop => stop(host),
        KeyAction::Fullscreen => Ok("fullscreen is not available in a terminal".to_string()),
    }
}
