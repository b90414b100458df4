//! Factory capability flags, name-attribute and URI conventions.

mod common;

use limskit::element::ElementHandle;
use limskit::xml::XmlTag;
use limskit::{BatchFlags, Entity, RegistryError};

use common::MockTransport;

macro_rules! test_entity {
    ($name:ident $(, $cname:ident : $cty:ty = $value:expr)*) => {
        #[derive(Debug)]
        struct $name {
            handle: ElementHandle,
        }

        impl Entity for $name {
            const TYPE_NAME: &'static str = stringify!($name);
            const ROOT_TAG: XmlTag = XmlTag::local("test-element");
            $(const $cname: $cty = $value;)*

            fn from_handle(handle: ElementHandle) -> Self {
                $name { handle }
            }

            fn handle(&self) -> &ElementHandle {
                &self.handle
            }
        }
    };
}

test_entity!(TestElement);
test_entity!(NoneElement, BATCH_FLAGS: BatchFlags = BatchFlags::NONE);
test_entity!(AllElement, BATCH_FLAGS: BatchFlags = BatchFlags::BATCH_ALL);
test_entity!(CreateElement, BATCH_FLAGS: BatchFlags = BatchFlags::BATCH_CREATE);
test_entity!(GetElement, BATCH_FLAGS: BatchFlags = BatchFlags::BATCH_GET);
test_entity!(UpdateElement, BATCH_FLAGS: BatchFlags = BatchFlags::BATCH_UPDATE);
test_entity!(QueryElement, BATCH_FLAGS: BatchFlags = BatchFlags::QUERY);
test_entity!(NamedElement, NAME_ATTRIBUTE: &'static str = "test_name");
test_entity!(PathElement, REQUEST_PATH: Option<&'static str> = Some("test/path"));
test_entity!(BadFlagsElement, BATCH_FLAGS: BatchFlags = BatchFlags::from_bits(0b1_0000));

#[test]
fn undeclared_capabilities_fail_closed() {
    let session = MockTransport::new().session();
    let factory = session.factory::<TestElement>().unwrap();
    assert!(!factory.can_batch_create());
    assert!(!factory.can_batch_get());
    assert!(!factory.can_batch_update());
    assert!(!factory.can_query());
}

#[test]
fn none_flags_grant_nothing() {
    let session = MockTransport::new().session();
    let factory = session.factory::<NoneElement>().unwrap();
    assert!(!factory.can_batch_create());
    assert!(!factory.can_batch_get());
    assert!(!factory.can_batch_update());
    assert!(!factory.can_query());
}

#[test]
fn batch_all_grants_everything() {
    let session = MockTransport::new().session();
    let factory = session.factory::<AllElement>().unwrap();
    assert!(factory.can_batch_create());
    assert!(factory.can_batch_get());
    assert!(factory.can_batch_update());
    assert!(factory.can_query());
}

#[test]
fn batch_create_grants_only_create() {
    let session = MockTransport::new().session();
    let factory = session.factory::<CreateElement>().unwrap();
    assert!(factory.can_batch_create());
    assert!(!factory.can_batch_get());
    assert!(!factory.can_batch_update());
    assert!(!factory.can_query());
}

#[test]
fn batch_get_grants_only_get() {
    let session = MockTransport::new().session();
    let factory = session.factory::<GetElement>().unwrap();
    assert!(!factory.can_batch_create());
    assert!(factory.can_batch_get());
    assert!(!factory.can_batch_update());
    assert!(!factory.can_query());
}

#[test]
fn batch_update_grants_only_update() {
    let session = MockTransport::new().session();
    let factory = session.factory::<UpdateElement>().unwrap();
    assert!(!factory.can_batch_create());
    assert!(!factory.can_batch_get());
    assert!(factory.can_batch_update());
    assert!(!factory.can_query());
}

#[test]
fn query_grants_only_query() {
    let session = MockTransport::new().session();
    let factory = session.factory::<QueryElement>().unwrap();
    assert!(!factory.can_batch_create());
    assert!(!factory.can_batch_get());
    assert!(!factory.can_batch_update());
    assert!(factory.can_query());
}

#[test]
fn name_attribute_defaults_to_name() {
    let session = MockTransport::new().session();
    let factory = session.factory::<TestElement>().unwrap();
    assert_eq!(factory.name_attribute(), "name");
}

#[test]
fn name_attribute_honors_override() {
    let session = MockTransport::new().session();
    let factory = session.factory::<NamedElement>().unwrap();
    assert_eq!(factory.name_attribute(), "test_name");
}

#[test]
fn uri_uses_explicit_request_path_verbatim() {
    let session = MockTransport::new().session();
    let factory = session.factory::<PathElement>().unwrap();
    assert!(factory.uri().ends_with("test/path"));
}

#[test]
fn uri_defaults_to_pluralized_type_name() {
    let session = MockTransport::new().session();
    let factory = session.factory::<TestElement>().unwrap();
    // Naive pluralization: lower-cased type name plus "s".
    assert!(factory.uri().ends_with("testelements"));
}

#[test]
fn unrecognized_flag_bits_fail_at_factory_construction() {
    let session = MockTransport::new().session();
    let err = session.factory::<BadFlagsElement>().unwrap_err();
    match err {
        RegistryError::InvalidFlags { type_name, bits } => {
            assert_eq!(type_name, "BadFlagsElement");
            assert_eq!(bits, 0b1_0000);
        }
    }
}

#[test]
fn builtin_factories_come_from_the_session_registry() {
    let session = MockTransport::new().session();
    assert!(session.artifacts().uri().ends_with("artifacts"));
    assert!(session.processes().uri().ends_with("processes"));
    assert!(session.control_types().uri().ends_with("controltypes"));
    assert!(session.workflows().uri().ends_with("configuration/workflows"));
}
