//! TOML catalog of shader demos.
//!
//! A catalog names each demo, ties it to an effect, and carries the optional
//! presentation settings (texture, palette, fps, antialias). `[defaults]`
//! supplies the fallback demo and fills in settings a demo leaves unset.
//! A builtin catalog covering the four stock effects is embedded so the
//! binary runs without any file on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use animator::EffectKind;
use serde::{Deserialize, Serialize};

pub const PALETTE_LEN: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid catalog: {0}")]
    Invalid(String),
}

/// Accepts the spelled-out variant names plus bare sample counts
/// (`antialias = "4"`) so catalogs read the way the CLI flag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntialiasSetting {
    #[serde(alias = "max", alias = "default")]
    Auto,
    #[serde(alias = "none", alias = "0", alias = "1")]
    Off,
    #[serde(alias = "2")]
    Samples2,
    #[serde(alias = "4")]
    Samples4,
    #[serde(alias = "8")]
    Samples8,
    #[serde(alias = "16")]
    Samples16,
}

impl AntialiasSetting {
    pub fn from_samples(samples: u32) -> Option<Self> {
        match samples {
            0 | 1 => Some(Self::Off),
            2 => Some(Self::Samples2),
            4 => Some(Self::Samples4),
            8 => Some(Self::Samples8),
            16 => Some(Self::Samples16),
            _ => None,
        }
    }

    /// Requested sample count; `None` means pick the best the adapter has.
    pub fn samples(self) -> Option<u32> {
        match self {
            Self::Auto => None,
            Self::Off => Some(1),
            Self::Samples2 => Some(2),
            Self::Samples4 => Some(4),
            Self::Samples8 => Some(8),
            Self::Samples16 => Some(16),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemoSet {
    pub version: u32,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub demos: BTreeMap<String, Demo>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Defaults {
    pub demo: Option<String>,
    pub fps: Option<f32>,
    #[serde(default)]
    pub antialias: Option<AntialiasSetting>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Demo {
    pub effect: EffectKind,
    #[serde(default)]
    pub texture: Option<PathBuf>,
    #[serde(default)]
    pub palette: Option<Vec<String>>,
    #[serde(default)]
    pub fps: Option<f32>,
    #[serde(default)]
    pub antialias: Option<AntialiasSetting>,
}

/// A demo with all defaults applied and the palette parsed to linear-ish
/// normalized RGBA, ready to hand to the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDemo {
    pub name: String,
    pub effect: EffectKind,
    pub texture: Option<PathBuf>,
    pub palette: Option<[[f32; 4]; PALETTE_LEN]>,
    pub fps: Option<f32>,
    pub antialias: Option<AntialiasSetting>,
}

impl DemoSet {
    /// The embedded catalog of the four stock demos.
    pub fn builtin() -> Self {
        // The embedded document is covered by a test, so parse cannot fail
        // at runtime.
        Self::from_toml_str(include_str!("builtin.toml"))
            .unwrap_or_else(|_| Self {
                version: 1,
                defaults: Defaults::default(),
                demos: BTreeMap::new(),
            })
    }

    pub fn from_toml_str(input: &str) -> Result<Self, CatalogError> {
        let raw: DemoSet = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let input = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn demo(&self, name: &str) -> Option<&Demo> {
        self.demos.get(name)
    }

    pub fn default_demo(&self) -> Option<&str> {
        self.defaults.demo.as_deref()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.demos.keys().map(String::as_str)
    }

    /// Looks up a demo, layers in `[defaults]`, and parses the palette.
    pub fn resolve(&self, name: &str) -> Result<ResolvedDemo, CatalogError> {
        let demo = self.demo(name).ok_or_else(|| {
            CatalogError::Invalid(format!("catalog has no demo named '{name}'"))
        })?;

        let palette = match &demo.palette {
            Some(entries) => Some(parse_palette(name, entries)?),
            None => None,
        };

        Ok(ResolvedDemo {
            name: name.to_string(),
            effect: demo.effect,
            texture: demo.texture.clone(),
            palette,
            fps: demo.fps.or(self.defaults.fps),
            antialias: demo.antialias.or(self.defaults.antialias),
        })
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.version != 1 {
            return Err(CatalogError::Invalid(format!(
                "unsupported catalog version {}; expected 1",
                self.version
            )));
        }

        if self.demos.is_empty() {
            return Err(CatalogError::Invalid(
                "catalog must define at least one demo".into(),
            ));
        }

        for (name, demo) in &self.demos {
            if name.trim().is_empty() {
                return Err(CatalogError::Invalid("demo name may not be empty".into()));
            }

            if let Some(texture) = &demo.texture {
                if texture.as_os_str().is_empty() {
                    return Err(CatalogError::Invalid(format!(
                        "demo '{name}' has an empty texture path"
                    )));
                }
            }

            if let Some(palette) = &demo.palette {
                parse_palette(name, palette)?;
            }

            if let Some(fps) = demo.fps {
                if fps < 0.0 {
                    return Err(CatalogError::Invalid(format!(
                        "demo '{name}' fps must be >= 0"
                    )));
                }
            }
        }

        if let Some(default_demo) = &self.defaults.demo {
            if !self.demos.contains_key(default_demo) {
                return Err(CatalogError::Invalid(format!(
                    "defaults.demo references unknown demo '{default_demo}'"
                )));
            }
        }

        if let Some(fps) = self.defaults.fps {
            if fps < 0.0 {
                return Err(CatalogError::Invalid("defaults.fps must be >= 0".into()));
            }
        }

        Ok(())
    }
}

fn parse_palette(
    demo: &str,
    entries: &[String],
) -> Result<[[f32; 4]; PALETTE_LEN], CatalogError> {
    if entries.len() != PALETTE_LEN {
        return Err(CatalogError::Invalid(format!(
            "demo '{demo}' palette has {} colors; expected exactly {PALETTE_LEN}",
            entries.len()
        )));
    }

    let mut palette = [[0.0; 4]; PALETTE_LEN];
    for (slot, raw) in palette.iter_mut().zip(entries) {
        *slot = parse_hex_color(raw).map_err(|err| {
            CatalogError::Invalid(format!("demo '{demo}' palette: {err}"))
        })?;
    }
    Ok(palette)
}

/// Parses `#RRGGBB` into normalized RGBA with alpha fixed at 1.0.
pub fn parse_hex_color(raw: &str) -> Result<[f32; 4], String> {
    let digits = raw
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| format!("color '{raw}' must start with '#'"))?;
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("color '{raw}' is not of the form #RRGGBB"));
    }

    let channel = |range: std::ops::Range<usize>| -> f32 {
        // Guarded above: six hex digits exactly.
        u8::from_str_radix(&digits[range], 16).unwrap_or(0) as f32 / 255.0
    };
    Ok([channel(0..2), channel(2..4), channel(4..6), 1.0])
}
