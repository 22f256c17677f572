//! Centralized CLI color functions.
//!
//! All functions respect `NO_COLOR`, `FORCE_COLOR`, and TTY detection via
//! `owo-colors`' `if_supports_color()`. The `--no-color` flag sets an
//! internal flag that bypasses owo-colors entirely.

use std::sync::atomic::{AtomicBool, Ordering};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

/// Global override: when true, forces color off (set by `--no-color`).
static NO_COLOR_FLAG: AtomicBool = AtomicBool::new(false);

/// Call once from main.rs when `--no-color` is passed.
pub fn set_no_color() {
    NO_COLOR_FLAG.store(true, Ordering::Relaxed);
}

fn no_color() -> bool {
    NO_COLOR_FLAG.load(Ordering::Relaxed)
}

pub fn success(s: &str) -> String {
    if no_color() {
        return s.to_string();
    }
    s.if_supports_color(Stdout, |t| t.green()).to_string()
}

pub fn warning(s: &str) -> String {
    if no_color() {
        return s.to_string();
    }
    s.if_supports_color(Stdout, |t| t.yellow()).to_string()
}

pub fn accent(s: &str) -> String {
    if no_color() {
        return s.to_string();
    }
    s.if_supports_color(Stdout, |t| t.cyan()).to_string()
}

pub fn muted(s: &str) -> String {
    if no_color() {
        return s.to_string();
    }
    s.if_supports_color(Stdout, |t| t.dimmed()).to_string()
}

pub fn bold(s: &str) -> String {
    if no_color() {
        return s.to_string();
    }
    s.if_supports_color(Stdout, |t| t.bold()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_color_flag_passes_through() {
        set_no_color();
        assert_eq!(success("ok"), "ok");
        assert_eq!(warning("careful"), "careful");
        assert_eq!(bold("strong"), "strong");
    }
}
