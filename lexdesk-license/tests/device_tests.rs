use lexdesk_license::{generate_fingerprint, HostMetadata, MachineFingerprint};

fn sample_metadata() -> HostMetadata {
    HostMetadata {
        hostname: "chambers-01".into(),
        platform: "linux".into(),
        arch: "x86_64".into(),
        cpu_model: "AMD Ryzen 7 5800X 8-Core Processor".into(),
        total_memory: 34_359_738_368,
    }
}

fn assert_shape(fp: &MachineFingerprint) {
    let groups: Vec<&str> = fp.as_str().split('-').collect();
    assert_eq!(groups.len(), 4, "{fp}");
    for g in groups {
        assert_eq!(g.len(), 8);
        assert!(g.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }
}

#[test]
fn generated_fingerprint_has_transcribable_shape() {
    assert_shape(&generate_fingerprint());
}

#[test]
fn generation_is_deterministic() {
    let fp1 = MachineFingerprint::generate();
    let fp2 = MachineFingerprint::generate();
    assert_eq!(fp1, fp2);
}

#[test]
fn metadata_derivation_is_pure() {
    let meta = sample_metadata();
    assert_eq!(
        MachineFingerprint::from_metadata(&meta),
        MachineFingerprint::from_metadata(&meta.clone())
    );
    assert_shape(&MachineFingerprint::from_metadata(&meta));
}

#[test]
fn every_component_contributes() {
    let base = MachineFingerprint::from_metadata(&sample_metadata());

    let variants = [
        HostMetadata { hostname: "chambers-02".into(), ..sample_metadata() },
        HostMetadata { platform: "windows".into(), ..sample_metadata() },
        HostMetadata { arch: "aarch64".into(), ..sample_metadata() },
        HostMetadata { cpu_model: "Apple M2".into(), ..sample_metadata() },
        HostMetadata { total_memory: 17_179_869_184, ..sample_metadata() },
    ];
    for meta in variants {
        assert_ne!(MachineFingerprint::from_metadata(&meta), base, "{meta:?}");
    }
}

#[test]
fn hostname_fallback_has_same_shape() {
    let fp = MachineFingerprint::from_hostname("chambers-01");
    assert_shape(&fp);
    assert_ne!(fp, MachineFingerprint::from_metadata(&sample_metadata()));
}

#[test]
fn collected_metadata_is_populated() {
    // Hardware queries may be unavailable in sandboxes; generate() then falls
    // back, which is covered above.
    if let Ok(meta) = HostMetadata::collect() {
        assert!(!meta.hostname.is_empty());
        assert!(!meta.platform.is_empty());
        assert!(!meta.arch.is_empty());
        assert!(!meta.cpu_model.is_empty());
        assert!(meta.total_memory > 0);
    }
}

#[test]
fn parse_accepts_lowercase_and_whitespace() {
    let fp = MachineFingerprint::from_hostname("chambers-01");
    let typed = format!("  {}\n", fp.as_str().to_lowercase());
    assert_eq!(MachineFingerprint::parse(&typed), Some(fp));
}

#[test]
fn parse_rejects_malformed_ids() {
    assert_eq!(MachineFingerprint::parse(""), None);
    assert_eq!(MachineFingerprint::parse("ABCDEF12-ABCDEF12-ABCDEF12"), None);
    assert_eq!(MachineFingerprint::parse("ABCDEF12-ABCDEF12-ABCDEF12-ABCDEF1Z"), None);
    assert_eq!(MachineFingerprint::parse("ABCDEF123-BCDEF12-ABCDEF12-ABCDEF12"), None);
}

#[test]
fn fingerprint_serializes_as_plain_string() {
    let fp = MachineFingerprint::from_hostname("chambers-01");
    let json = serde_json::to_string(&fp).unwrap();
    assert_eq!(json, format!("\"{fp}\""));
    let parsed: MachineFingerprint = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, fp);
}
