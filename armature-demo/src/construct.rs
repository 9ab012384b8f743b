use {
    crate::config::{BoneConfig, Config},
    armature::{Armature, BoneId},
    color_eyre::Report,
    nalgebra as na,
    std::collections::HashMap,
};

/// Builds armature with bones listed in config.
pub fn build_armature(config: &Config) -> Result<Armature, Report> {
    let mut armature = Armature::new();
    let mut ids: HashMap<&str, BoneId> = HashMap::new();

    for bone_config in &config.bones {
        let parent = match &bone_config.parent {
            None => None,
            Some(name) => match ids.get(name.as_str()) {
                Some(&id) => Some(id),
                None => {
                    return Err(eyre::eyre!(
                        "Bone '{}' refers to unknown parent '{}'",
                        bone_config.name,
                        name
                    ))
                }
            },
        };

        let id = add_bone(&mut armature, parent, bone_config)?;
        tracing::debug!("Bone '{}' added as {:?}", bone_config.name, id);
        ids.insert(&bone_config.name, id);
    }

    armature.apply_properties(&config.properties)?;
    Ok(armature)
}

fn add_bone(
    armature: &mut Armature,
    parent: Option<BoneId>,
    config: &BoneConfig,
) -> Result<BoneId, Report> {
    let mut bone = armature.create_bone(parent, config.name.as_str())?;
    if let Some(head) = &config.head {
        bone.set_world_head_rest(na::Point3::from_slice(head));
    }
    bone.set_world_tail_rest(na::Point3::from_slice(&config.tail));
    bone.set_roll(config.roll);

    let id = armature.add_bone(bone, parent, config.linked)?;
    Ok(id)
}

/// Applies configured pose rotations. Armature must be in pose mode.
pub fn apply_poses(
    armature: &mut Armature,
    config: &Config,
) -> Result<(), Report> {
    for pose in &config.poses {
        let id = armature.bone_by_name(&pose.bone).ok_or_else(|| {
            eyre::eyre!("Pose refers to unknown bone '{}'", pose.bone)
        })?;

        let axis = na::Unit::new_normalize(na::Vector3::from_row_slice(
            &pose.axis,
        ));

        if let Some(mut bone) = armature.bone_mut(id) {
            bone.rotate_pose(&axis, pose.angle.to_radians());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, armature::WidgetState};

    fn config(source: &str) -> Config {
        ron::de::from_str(source).unwrap()
    }

    #[test]
    fn builds_linked_chain() {
        let config = config(
            r#"(
                bones: [
                    (name: "root", tail: (0.0, 1.0, 0.0)),
                    (
                        name: "arm",
                        parent: Some("root"),
                        head: Some((4.0, 4.0, 4.0)),
                        tail: (1.0, 1.0, 0.0),
                        linked: true,
                    ),
                ],
            )"#,
        );

        let armature = build_armature(&config).unwrap();
        let root = armature.bone_by_name("root").unwrap();
        let arm = armature.bone_by_name("arm").unwrap();

        assert_eq!(armature.bone_parent(arm), Some(root));
        assert_eq!(
            armature.bone(arm).unwrap().world_head_rest(),
            armature.bone(root).unwrap().world_tail_rest()
        );
    }

    #[test]
    fn unknown_parent_is_an_error() {
        let config = config(
            r#"(
                bones: [
                    (name: "arm", parent: Some("root"), tail: (1.0, 0.0, 0.0)),
                ],
            )"#,
        );

        assert!(build_armature(&config).is_err());
    }

    #[test]
    fn poses_rotate_bones() {
        let config = config(
            r#"(
                bones: [
                    (name: "root", tail: (0.0, 1.0, 0.0)),
                ],
                poses: [
                    (bone: "root", axis: (0.0, 0.0, 1.0), angle: 90.0),
                ],
            )"#,
        );

        let mut armature = build_armature(&config).unwrap();
        armature.set_widget_state(WidgetState::Pose).unwrap();
        apply_poses(&mut armature, &config).unwrap();

        let root = armature.bone_by_name("root").unwrap();
        let tail = armature.bone(root).unwrap().world_tail_pose();
        assert!((tail - na::Point3::new(-1.0, 0.0, 0.0)).norm() < 1e-9);
    }
}
