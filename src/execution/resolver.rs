use super::log::JobLog;
use super::target::TargetRef;
use super::variables::VariableTable;
use crate::world::{Capability, Host, ObjectKind, ObjectRef};

pub fn resolve(
    host: &mut Host,
    vars: &VariableTable,
    log: &mut JobLog,
    target: &TargetRef,
) -> Option<ObjectRef> {
    match target {
        TargetRef::Var(name) => {
            let found = vars.get(name);
            if found.is_none() {
                log.warn(format!("Variable not found: {name}"));
            }
            found
        }
        TargetRef::Asset { guid, path } => {
            let by_guid = guid
                .as_deref()
                .and_then(|guid| host.assets.load_by_guid(guid));
            let found = by_guid.or_else(|| {
                path.as_deref()
                    .and_then(|path| host.assets.load_by_path(path))
            });
            match found {
                Some(id) => Some(ObjectRef::Asset(id)),
                None => {
                    log.warn(format!("Asset not found: {target}"));
                    None
                }
            }
        }
        TargetRef::ScenePath(path) => {
            let found = host
                .scene
                .find_by_name(path)
                .or_else(|| host.scene.find_by_path(path));
            match found {
                Some(id) => Some(ObjectRef::GameObject(id)),
                None => {
                    log.warn(format!("Scene object not found: {path}"));
                    None
                }
            }
        }
    }
}

pub fn satisfies(host: &Host, object: ObjectRef, capability: &Capability) -> bool {
    match (object, capability) {
        (ObjectRef::GameObject(_), Capability::GameObject) => true,
        (ObjectRef::Asset(_), Capability::Asset) => true,
        (ObjectRef::Component(_), Capability::Component(None)) => true,
        (ObjectRef::Component(id), Capability::Component(Some(wanted))) => host
            .scene
            .component_type(id)
            .is_some_and(|actual| actual.eq_ignore_ascii_case(wanted)),
        _ => false,
    }
}

pub fn coerce(
    host: &Host,
    log: &mut JobLog,
    object: ObjectRef,
    capability: &Capability,
) -> Option<ObjectRef> {
    if satisfies(host, object, capability) {
        return Some(object);
    }
    let coerced = match (object, capability) {
        (ObjectRef::GameObject(go), Capability::Component(type_name)) => host
            .scene
            .component_of(go, type_name.as_deref())
            .map(ObjectRef::Component),
        (ObjectRef::Component(component), Capability::GameObject) => {
            host.scene.owner_of(component).map(ObjectRef::GameObject)
        }
        _ => None,
    };
    if coerced.is_none() {
        log.warn(format!(
            "Cannot convert {} to {capability}",
            host.describe(object)
        ));
    }
    coerced
}

pub fn kind_matches(host: &Host, log: &mut JobLog, name: &str, object: ObjectRef, capability: &Capability) -> bool {
    if satisfies(host, object, capability) {
        return true;
    }
    let actual = match object {
        ObjectRef::Component(id) => host
            .scene
            .component_type(id)
            .map(|type_name| format!("Component<{type_name}>"))
            .unwrap_or_else(|| ObjectKind::Component.to_string()),
        other => other.kind().to_string(),
    };
    log.warn(format!(
        "Variable {name} is {actual}, expected {capability}"
    ));
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{GameObjectId, Host};
    use serde_json::Map;
    use tempfile::tempdir;

    struct Fixture {
        _dir: tempfile::TempDir,
        host: Host,
        vars: VariableTable,
        log: JobLog,
        spawner: GameObjectId,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().expect("tempdir");
        let mut host = Host::in_memory(dir.path());
        let level = host.scene.create_object("Level", None).expect("level");
        let spawner = host
            .scene
            .create_object("Spawner", Some(level))
            .expect("spawner");
        host.scene.add_component(spawner, "Tag").expect("tag");
        Fixture {
            _dir: dir,
            host,
            vars: VariableTable::new(),
            log: JobLog::new("t", false),
            spawner,
        }
    }

    #[test]
    fn scene_paths_try_direct_name_then_hierarchy_walk() {
        let mut fx = fixture();
        let direct = resolve(
            &mut fx.host,
            &fx.vars,
            &mut fx.log,
            &TargetRef::ScenePath("Spawner".to_string()),
        );
        let walked = resolve(
            &mut fx.host,
            &fx.vars,
            &mut fx.log,
            &TargetRef::ScenePath("Level/Spawner".to_string()),
        );
        assert_eq!(direct, Some(ObjectRef::GameObject(fx.spawner)));
        assert_eq!(walked, direct);
        assert!(fx.log.entries().is_empty());
    }

    #[test]
    fn misses_return_none_with_a_warning_and_do_not_bind() {
        let mut fx = fixture();
        let miss = resolve(
            &mut fx.host,
            &fx.vars,
            &mut fx.log,
            &TargetRef::Var("$nothing".to_string()),
        );
        assert_eq!(miss, None);
        assert!(fx.vars.is_empty());
        assert_eq!(fx.log.entries().len(), 1);
        assert!(fx.log.entries()[0].message.contains("$nothing"));
    }

    #[test]
    fn assets_resolve_by_guid_then_path() {
        let mut fx = fixture();
        let id = fx
            .host
            .assets
            .create("Assets/AutoGen/a.asset", "Config", Map::new(), false)
            .expect("asset");
        let by_path = resolve(
            &mut fx.host,
            &fx.vars,
            &mut fx.log,
            &TargetRef::Asset {
                guid: Some("not-a-guid".to_string()),
                path: Some("Assets/AutoGen/a.asset".to_string()),
            },
        );
        assert_eq!(by_path, Some(ObjectRef::Asset(id)));
    }

    #[test]
    fn coercion_is_one_hop_between_whole_and_part() {
        let mut fx = fixture();
        let go = ObjectRef::GameObject(fx.spawner);
        let tag = coerce(&fx.host, &mut fx.log, go, &Capability::component("Tag"))
            .expect("part of whole");
        assert_eq!(tag.kind(), ObjectKind::Component);
        assert_eq!(
            coerce(&fx.host, &mut fx.log, tag, &Capability::GameObject),
            Some(go)
        );
        assert_eq!(coerce(&fx.host, &mut fx.log, go, &Capability::GameObject), Some(go));
        assert!(fx.log.entries().is_empty());

        assert_eq!(
            coerce(&fx.host, &mut fx.log, go, &Capability::component("Rigidbody")),
            None
        );
        assert_eq!(coerce(&fx.host, &mut fx.log, tag, &Capability::Asset), None);
        assert_eq!(
            coerce(&fx.host, &mut fx.log, tag, &Capability::component("Collider")),
            None
        );
        assert_eq!(fx.log.entries().len(), 3);
        assert!(fx.log.entries()[0].message.starts_with("Cannot convert"));
    }
}
