use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use deploykit::{DeployError, DeployRegistry};

fn counting_routine(
    counter: Arc<AtomicUsize>,
    fail: bool,
) -> impl Fn(PathBuf) -> futures::future::BoxFuture<'static, Result<(), DeployError>> {
    move |_workspace| {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            if fail {
                Err(DeployError::command(3, "routine exploded"))
            } else {
                Ok(())
            }
        })
    }
}

#[tokio::test]
async fn routines_run_in_registration_order() {
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut registry = DeployRegistry::new();
    for name in ["migrate", "restart", "verify"] {
        let order = order.clone();
        registry
            .register(name, move |_workspace| {
                let order = order.clone();
                Box::pin(async move {
                    order.lock().unwrap().push(name);
                    Ok(())
                })
            })
            .expect("register");
    }

    registry.run_all(Path::new("/tmp")).await.expect("run_all");
    assert_eq!(*order.lock().unwrap(), vec!["migrate", "restart", "verify"]);
}

#[tokio::test]
async fn first_failure_aborts_remaining_routines() {
    let ran = Arc::new(AtomicUsize::new(0));
    let mut registry = DeployRegistry::new();
    registry
        .register("ok", counting_routine(ran.clone(), false))
        .expect("register ok");
    registry
        .register("boom", counting_routine(ran.clone(), true))
        .expect("register boom");
    registry
        .register("never", counting_routine(ran.clone(), false))
        .expect("register never");

    let result = registry.run_all(Path::new("/tmp")).await;
    assert!(matches!(
        result,
        Err(DeployError::Command { status: 3, .. })
    ));
    assert_eq!(ran.load(Ordering::SeqCst), 2, "third routine must not run");
}

#[tokio::test]
async fn duplicate_routine_name_is_config_error() {
    let mut registry = DeployRegistry::new();
    registry
        .register("deploy", |_workspace| Box::pin(async { Ok(()) }))
        .expect("first registration");
    let result = registry.register("deploy", |_workspace| Box::pin(async { Ok(()) }));
    assert!(matches!(result, Err(DeployError::Config(_))));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn empty_registry_run_is_ok() {
    let registry = DeployRegistry::new();
    assert!(registry.is_empty());
    registry.run_all(Path::new("/tmp")).await.expect("run_all");
}
