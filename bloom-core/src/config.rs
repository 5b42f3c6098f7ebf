use std::path::{Path, PathBuf};

use serde::Deserialize;

use bloom_types::{Key, MusicalKey, PitchRange, Scale, DEFAULT_FILL_VELOCITY};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");
const DEFAULT_GARBAGE_CAPACITY: usize = 64;

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    playback: PlaybackConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    key: Option<String>,
    scale: Option<String>,
    pitch_low: Option<u8>,
    pitch_high: Option<u8>,
    fill_velocity: Option<f32>,
    fill_density: Option<f32>,
}

#[derive(Deserialize, Default)]
struct PlaybackConfig {
    seed: Option<u64>,
    garbage_capacity: Option<usize>,
}

pub struct Config {
    defaults: DefaultsConfig,
    playback: PlaybackConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_user_file(None)
    }
}

impl Config {
    /// Embedded defaults merged with the user's `bloom/config.toml`, if any.
    pub fn load() -> Self {
        Self::from_user_file(user_config_path().as_deref())
    }

    /// Embedded defaults merged with the file at `path`.
    pub fn load_from(path: &Path) -> Self {
        Self::from_user_file(Some(path))
    }

    fn from_user_file(path: Option<&Path>) -> Self {
        let mut base: ConfigFile = match toml::from_str(DEFAULT_CONFIG) {
            Ok(base) => base,
            Err(e) => {
                log::error!(target: "config", "embedded config.toml is invalid: {}", e);
                ConfigFile::default()
            }
        };

        if let Some(path) = path.filter(|p| p.exists()) {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                    Ok(user) => {
                        merge_defaults(&mut base.defaults, user.defaults);
                        merge_playback(&mut base.playback, user.playback);
                    }
                    Err(e) => {
                        log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                    }
                },
                Err(e) => {
                    log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                }
            }
        }

        Config {
            defaults: base.defaults,
            playback: base.playback,
        }
    }

    /// Project key used when neither node nor tree override it.
    pub fn default_key(&self) -> MusicalKey {
        let key = self
            .defaults
            .key
            .as_deref()
            .and_then(Key::from_name)
            .unwrap_or(Key::C);
        let scale = self
            .defaults
            .scale
            .as_deref()
            .and_then(Scale::from_name)
            .unwrap_or(Scale::Major);
        MusicalKey::new(key, scale)
    }

    /// Range for fills that don't carry their own.
    pub fn pitch_range(&self) -> PitchRange {
        let fallback = PitchRange::default();
        PitchRange::new(
            self.defaults.pitch_low.unwrap_or(fallback.low),
            self.defaults.pitch_high.unwrap_or(fallback.high),
        )
    }

    pub fn fill_velocity(&self) -> f32 {
        unit_or(self.defaults.fill_velocity, DEFAULT_FILL_VELOCITY)
    }

    pub fn fill_density(&self) -> f32 {
        unit_or(self.defaults.fill_density, 0.5)
    }

    pub fn playback_seed(&self) -> u64 {
        self.playback.seed.unwrap_or(0)
    }

    /// Bound of the retired-snapshot channel (at least 1).
    pub fn garbage_capacity(&self) -> usize {
        self.playback
            .garbage_capacity
            .unwrap_or(DEFAULT_GARBAGE_CAPACITY)
            .max(1)
    }
}

fn unit_or(value: Option<f32>, fallback: f32) -> f32 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => fallback,
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bloom").join("config.toml"))
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.key.is_some() {
        base.key = user.key;
    }
    if user.scale.is_some() {
        base.scale = user.scale;
    }
    if user.pitch_low.is_some() {
        base.pitch_low = user.pitch_low;
    }
    if user.pitch_high.is_some() {
        base.pitch_high = user.pitch_high;
    }
    if user.fill_velocity.is_some() {
        base.fill_velocity = user.fill_velocity;
    }
    if user.fill_density.is_some() {
        base.fill_density = user.fill_density;
    }
}

fn merge_playback(base: &mut PlaybackConfig, user: PlaybackConfig) {
    if user.seed.is_some() {
        base.seed = user.seed;
    }
    if user.garbage_capacity.is_some() {
        base.garbage_capacity = user.garbage_capacity;
    }
}
