//! Owner → mirror replication through a serialized wire.

use roomsync_protocol::{PeerId, TickPayload, ViewId};
use roomsync_replication::{EntityRegistry, FireInput, PlayerAvatar, SyncMode};

const HOST: PeerId = PeerId(1);
const GUEST: PeerId = PeerId(2);

fn over_the_wire(payload: &TickPayload) -> TickPayload {
    let bytes = serde_json::to_vec(payload).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Each peer spawns its own avatar plus a mirror of the other's.
fn registries(mode: SyncMode) -> (EntityRegistry, EntityRegistry) {
    let mut host = EntityRegistry::new();
    host.insert(PlayerAvatar::spawn(ViewId(1), HOST, HOST, mode, None, None)).unwrap();
    host.insert(PlayerAvatar::spawn(ViewId(2), GUEST, HOST, mode, None, None)).unwrap();

    let mut guest = EntityRegistry::new();
    guest.insert(PlayerAvatar::spawn(ViewId(1), HOST, GUEST, mode, None, None)).unwrap();
    guest.insert(PlayerAvatar::spawn(ViewId(2), GUEST, GUEST, mode, None, None)).unwrap();

    (host, guest)
}

#[test]
fn test_both_peers_mirror_each_other() {
    let (mut host, mut guest) = registries(SyncMode::Unsequenced);

    host.get_mut(ViewId(1)).unwrap().process_input(FireInput::Down);
    guest.get_mut(ViewId(2)).unwrap().contact_begin("Beam");

    for (view, payload) in host.capture_owned() {
        assert!(guest.apply(view, HOST, &over_the_wire(&payload)).unwrap());
    }
    for (view, payload) in guest.capture_owned() {
        assert!(host.apply(view, GUEST, &over_the_wire(&payload)).unwrap());
    }

    assert!(guest.get(ViewId(1)).unwrap().is_firing());
    assert!((host.get(ViewId(2)).unwrap().health() - 0.9).abs() < 1e-6);
}

#[test]
fn test_unsequenced_wire_shape_is_bare_pair() {
    let (mut host, _) = registries(SyncMode::Unsequenced);

    let ticks = host.capture_owned();
    let json = serde_json::to_string(&ticks[0].1).unwrap();

    assert_eq!(json, r#"[{"Bool":false},{"Float":1.0}]"#);
}

#[test]
fn test_sequenced_reordered_delivery_keeps_newest() {
    let (mut host, mut guest) = registries(SyncMode::Sequenced);
    let avatar = host.get_mut(ViewId(1)).unwrap();

    avatar.contact_begin("Beam");
    let older = avatar.capture_tick().unwrap();
    avatar.contact_begin("Beam");
    let newer = avatar.capture_tick().unwrap();

    assert!(guest.apply(ViewId(1), HOST, &newer).unwrap());
    assert!(!guest.apply(ViewId(1), HOST, &older).unwrap());

    assert!((guest.get(ViewId(1)).unwrap().health() - 0.8).abs() < 1e-6);
}

#[test]
fn test_spoofed_sender_cannot_write_mirror() {
    let (mut host, mut guest) = registries(SyncMode::Unsequenced);
    host.get_mut(ViewId(1)).unwrap().contact_begin("Beam");
    let (view, payload) = host.capture_owned().remove(0);

    // Claims to be from the guest, who doesn't own view 1.
    assert!(!guest.apply(view, GUEST, &payload).unwrap());
    assert_eq!(guest.get(ViewId(1)).unwrap().health(), 1.0);
}
