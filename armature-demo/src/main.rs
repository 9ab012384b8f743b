mod config;
mod construct;

use {
    self::{
        config::Config,
        construct::{apply_poses, build_armature},
    },
    armature::{Armature, WidgetState},
    color_eyre::Report,
    eyre::WrapErr,
    tracing_error::ErrorLayer,
    tracing_subscriber::{prelude::*, EnvFilter},
};

fn main() -> Result<(), Report> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(ErrorLayer::default())
        .init();

    color_eyre::install()?;

    tracing::info!("Running at {}", std::env::current_dir()?.display());
    let config = Config::load_default()?;
    tracing::info!("Config loaded: {:?}", config);

    let mut armature =
        build_armature(&config).wrap_err("Failed to build armature")?;
    tracing::info!("{}", armature);

    armature.set_widget_state(WidgetState::Pose)?;
    apply_poses(&mut armature, &config)?;
    log_tails(&armature);

    armature.set_widget_state(WidgetState::Rest)?;
    log_tails(&armature);

    match armature.bounds() {
        Some(bounds) => tracing::info!(
            "Armature bounds: {:?} .. {:?}",
            bounds.min,
            bounds.max
        ),
        None => tracing::info!("Armature has no represented bones"),
    }

    Ok(())
}

fn log_tails(armature: &Armature) {
    for (_, bone) in armature.bones() {
        tracing::info!(
            "{:?} tail of '{}': {}",
            armature.widget_state(),
            bone.name(),
            bone.current_world_tail()
        );
    }
}
