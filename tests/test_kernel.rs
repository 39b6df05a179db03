//! Tests for the Kernel built-ins, tracing and configuration loading.

extern crate mixin_engine;

mod common;

use std::fs;

use common::{call, init_test_logger};
use mixin_engine::runtime::config::ModelConfig;
use mixin_engine::runtime::std_lib::kernel;
use mixin_engine::runtime::{Class, Members, ModelError, Module, Object, Value};

fn widget() -> (Class, Object) {
    let class = Class::define(
        "Widget",
        None,
        Members::new().method("size", |_this, _args| Ok(Value::from(3))),
    )
    .unwrap();
    let obj = class.new_instance(Vec::new()).unwrap();
    (class, obj)
}

// ============================================================================
// Kernel methods
// ============================================================================

mod kernel_tests {
    use super::*;

    #[test]
    fn test_is_a_accepts_classes_and_modules() {
        let (class, obj) = widget();
        assert_eq!(
            obj.call("is_a", vec![Value::Class(class)]).unwrap(),
            Value::from(true)
        );
        assert_eq!(
            obj.call("is_a", vec![Value::Module(kernel())]).unwrap(),
            Value::from(true)
        );
        assert_eq!(
            obj.call("is_a", vec![Value::Module(Module::new("Other"))])
                .unwrap(),
            Value::from(false)
        );
    }

    #[test]
    fn test_is_a_rejects_non_modules() {
        let (_, obj) = widget();
        match obj.call("is_a", vec![Value::from("Widget")]) {
            Err(ModelError::TypeError(_)) => {}
            other => panic!("expected a type error, got {:?}", other),
        }
    }

    #[test]
    fn test_extend_through_kernel() {
        let (_, obj) = widget();
        let extra = Module::define(
            "Extra",
            Members::new().method("bonus", |_this, _args| Ok(Value::from("bonus"))),
        )
        .unwrap();
        let returned = obj.call("extend", vec![Value::Module(extra)]).unwrap();
        assert_eq!(returned, Value::Object(obj.clone()));
        assert_eq!(call(&obj, "bonus").unwrap(), Value::from("bonus"));
    }

    #[test]
    fn test_equals_and_hash_use_identity() {
        let (class, obj) = widget();
        let other = class.new_instance(Vec::new()).unwrap();
        assert_eq!(
            obj.call("equals", vec![Value::Object(obj.clone())]).unwrap(),
            Value::from(true)
        );
        assert_eq!(
            obj.call("equals", vec![Value::Object(other.clone())]).unwrap(),
            Value::from(false)
        );
        assert_eq!(call(&obj, "hash").unwrap(), Value::from(obj.id()));
        assert_ne!(call(&obj, "hash").unwrap(), call(&other, "hash").unwrap());
    }

    #[test]
    fn test_respond_to() {
        let (_, obj) = widget();
        assert_eq!(
            obj.call("respond_to", vec![Value::from("size")]).unwrap(),
            Value::from(true)
        );
        assert_eq!(
            obj.call("respond_to", vec![Value::from("missing")]).unwrap(),
            Value::from(false)
        );
        assert!(obj.call("respond_to", vec![Value::from(1)]).is_err());
    }

    #[test]
    fn test_methods_lists_callables() {
        let (_, obj) = widget();
        let methods = match call(&obj, "methods").unwrap() {
            Value::List(items) => items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect::<Vec<String>>(),
            other => panic!("expected a list, got {:?}", other),
        };
        assert!(methods.contains(&"size".to_string()));
        assert!(methods.contains(&"is_a".to_string()));
        assert!(methods.contains(&"to_string".to_string()));
    }

    #[test]
    fn test_to_string_names_the_class() {
        let (_, obj) = widget();
        let text = call(&obj, "to_string").unwrap();
        assert!(text.as_str().unwrap_or("").starts_with("#<Widget:"));
    }

    #[test]
    fn test_kernel_methods_can_be_overridden_with_super() {
        let class = Class::define(
            "Labelled",
            None,
            Members::new().super_method("to_string", |this, _args| {
                let base = this.call_super(Vec::new())?;
                Ok(Value::from(format!("labelled {}", base)))
            }),
        )
        .unwrap();
        let obj = class.new_instance(Vec::new()).unwrap();
        let text = call(&obj, "to_string").unwrap();
        assert!(text.as_str().unwrap_or("").starts_with("labelled #<Labelled:"));
    }

    #[test]
    fn test_class_objects_answer_kernel_methods() {
        let (class, _) = widget();
        let class_object = class.object().unwrap();
        assert_eq!(call(&class_object, "to_string").unwrap(), Value::from("Widget"));
        assert_eq!(
            class_object
                .call("respond_to", vec![Value::from("is_a")])
                .unwrap(),
            Value::from(true)
        );
    }
}

// ============================================================================
// Tracing
// ============================================================================

mod trace_tests {
    use super::*;

    #[test]
    fn test_traced_module_still_dispatches() {
        init_test_logger();
        let (class, obj) = widget();
        class.module().set_trace(true);
        assert!(class.module().is_traced());
        assert_eq!(call(&obj, "size").unwrap(), Value::from(3));
        class.module().set_trace(false);
        assert!(!class.module().is_traced());
    }
}

// ============================================================================
// Configuration
// ============================================================================

mod config_tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("mixin-config-{}.conf", std::process::id()));
        fs::write(&path, "# quiet\nwarn_on_collision = false\ntrace_all = true\n").unwrap();
        let config = ModelConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(!config.warn_on_collision);
        assert!(config.trace_all);
        assert!(config.warn_on_double_destroy);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let path = std::env::temp_dir().join("mixin-config-does-not-exist.conf");
        match ModelConfig::load(&path) {
            Err(ModelError::ConfigError(msg)) => assert!(msg.contains("failed to read")),
            other => panic!("expected a config error, got {:?}", other),
        }
    }
}
