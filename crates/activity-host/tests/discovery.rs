#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod support;

use std::time::Duration;

use serde_json::json;

use activity_core::protocol::envelope::{encode, encode_component};
use activity_host::config::HostConfig;
use activity_host::{connect_host, ActivityHost, ActivityMode, ConnectHost, HostStrategy};

use support::*;

#[test]
fn picks_strategy_from_opener() {
    let cfg = HostConfig::default();
    let popup = HostStrategy::discover(FakeDialog::popup(), FakeTransport::new(), &cfg);
    assert_eq!(popup.mode(), ActivityMode::Popup);

    let redirect = HostStrategy::discover(FakeDialog::new(None), FakeTransport::new(), &cfg);
    assert_eq!(redirect.mode(), ActivityMode::Redirect);
}

#[tokio::test]
async fn popup_dialog_connects_over_channel() {
    let dialog = FakeDialog::popup();
    let transport = FakeTransport::new();
    let cfg = HostConfig::default();

    let (handle, _) = tokio::join!(
        connect_host(dialog.clone(), transport.clone(), &cfg, Some(request().into())),
        async {
            tokio::task::yield_now().await;
            transport.deliver(opener_command("start", Some(json!({"b": 2}))));
        }
    );
    let handle = handle.unwrap();
    assert_eq!(handle.mode(), ActivityMode::Popup);
    assert!(handle.is_secure_channel().unwrap());
    assert_eq!(handle.args().unwrap(), Some(json!({"b": 2})));
}

#[tokio::test(start_paused = true)]
async fn size_wiring_survives_connect() {
    let dialog = FakeDialog::new(None);
    let strategy = HostStrategy::discover(dialog.clone(), FakeTransport::new(), &HostConfig::default());
    let (calls, cb) = resize_recorder();
    strategy.on_resize_complete(cb);
    strategy.set_size_container(FakeContainer::new(dialog.available() + 10));

    let handle = strategy.connect(Some(request().into())).await.unwrap();
    handle.resized();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        *calls.lock().unwrap(),
        vec![(dialog.available(), dialog.available() + 10, true)]
    );
}

#[tokio::test]
async fn navigated_dialog_reads_its_fragment() {
    let dialog = FakeDialog::new(None);
    let enc = encode_component(&encode(&request()).unwrap());
    dialog.set_location(&format!("{DIALOG_ORIGIN}/activity?x=1#tab=2&__WA__={enc}"));

    let strategy = HostStrategy::discover(dialog.clone(), FakeTransport::new(), &HostConfig::default());
    let handle = strategy.connect(None).await.unwrap();
    assert_eq!(handle.mode(), ActivityMode::Redirect);
    assert_eq!(handle.target_origin().unwrap(), PUB_ORIGIN);

    handle.accept().unwrap();
    handle.cancel().unwrap();
    assert_eq!(dialog.navigations().len(), 1);
    assert!(dialog.navigations()[0].starts_with("https://example-pub.com/opener#__WA_RES__="));
}
