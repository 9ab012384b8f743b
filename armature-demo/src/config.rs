use {
    armature::ArmatureProperties, color_eyre::Report, eyre::WrapErr,
    std::path::PathBuf,
};

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub properties: ArmatureProperties,

    pub bones: Vec<BoneConfig>,

    #[serde(default)]
    pub poses: Vec<PoseConfig>,
}

/// Bone description.
///
/// Bones are created in listed order, so parent must come before children.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct BoneConfig {
    pub name: String,

    #[serde(default)]
    pub parent: Option<String>,

    /// Rest head. Defaults to parent's rest tail.
    #[serde(default)]
    pub head: Option<[f64; 3]>,

    pub tail: [f64; 3],

    #[serde(default)]
    pub roll: f64,

    #[serde(default)]
    pub linked: bool,
}

/// Rotation applied to a bone once armature enters pose mode.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct PoseConfig {
    pub bone: String,
    pub axis: [f64; 3],

    /// Angle in degrees.
    pub angle: f64,
}

impl Config {
    pub fn load_default() -> Result<Self, Report> {
        let path = std::env::var("BENDER_ARMATURE_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./armature.ron"));

        let config = Self::load(path.clone()).wrap_err_with(|| {
            format!("Failed to load config from '{}'", path.display())
        })?;
        Ok(config)
    }

    #[tracing::instrument]
    pub fn load(path: PathBuf) -> Result<Self, Report> {
        Ok(ron::de::from_reader(std::fs::File::open(&path)?)?)
    }
}
