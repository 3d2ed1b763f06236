use jp2box::{Decoder, FindingKind, FourCC, NodeStatus, Property, Rational, SamplingFrequencyUnit};
use proptest::prelude::*;

fn jp2_box(typ: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut v = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    v.extend_from_slice(typ);
    v.extend_from_slice(body);
    v
}

fn resc_body(v_num: u16, v_den: u16, h_num: u16, h_den: u16, v_exp: u8, h_exp: u8) -> Vec<u8> {
    let mut v = Vec::with_capacity(10);
    v.extend_from_slice(&v_num.to_be_bytes());
    v.extend_from_slice(&v_den.to_be_bytes());
    v.extend_from_slice(&h_num.to_be_bytes());
    v.extend_from_slice(&h_den.to_be_bytes());
    v.push(v_exp);
    v.push(h_exp);
    v
}

/// jp2h > res  > resc(body)
fn in_resolution(body: &[u8]) -> Vec<u8> {
    jp2_box(b"jp2h", &jp2_box(b"res ", &jp2_box(b"resc", body)))
}

fn int(p: &Property, name: &str) -> i64 {
    p.child(name).and_then(|c| c.as_integer()).expect(name)
}

#[test]
fn hundred_dots_per_meter_with_exponent_two() {
    let data = in_resolution(&resc_body(100, 1, 100, 1, 2, 2));
    let doc = Decoder::new().decode_bytes(&data).unwrap();

    assert!(doc.is_conformant());
    let expected = Rational::new(10000, 100).unwrap();
    assert!(doc.metadata.y_sampling_frequency.unwrap().is_identical(&expected));
    assert!(doc.metadata.x_sampling_frequency.unwrap().is_identical(&expected));
    let unit = doc.metadata.sampling_frequency_unit.unwrap();
    assert_eq!(unit, SamplingFrequencyUnit::Centimeter);
    assert_eq!(unit.code(), 3);
}

#[test]
fn capture_resolution_property_shape() {
    let data = in_resolution(&resc_body(1, 2, 3, 4, 5, 6));
    let doc = Decoder::new().decode_bytes(&data).unwrap();

    let cr = doc.property("CaptureResolution").expect("module property");
    let names: Vec<_> = cr.children().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["HorizResolution", "VertResolution"]);

    for axis in cr.children() {
        let fields: Vec<_> = axis.children().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(fields, ["Numerator", "Denominator", "Exponent"]);
        assert!(axis.children().iter().all(|c| c.as_integer().is_some()));
    }

    let horiz = cr.child("HorizResolution").unwrap();
    assert_eq!((int(horiz, "Numerator"), int(horiz, "Denominator"), int(horiz, "Exponent")), (3, 4, 6));
    let vert = cr.child("VertResolution").unwrap();
    assert_eq!((int(vert, "Numerator"), int(vert, "Denominator"), int(vert, "Exponent")), (1, 2, 5));

    // same tree is attached to the box itself
    let resc = doc.tree.find(FourCC(*b"resc")).unwrap();
    assert_eq!(doc.tree.get(resc).properties, vec![cr.clone()]);
}

#[test]
fn resc_outside_resolution_box_is_wrong_context() {
    let data = jp2_box(b"jp2h", &jp2_box(b"resc", &resc_body(100, 1, 100, 1, 2, 2)));
    let doc = Decoder::new().decode_bytes(&data).unwrap();

    let resc = doc.tree.find(FourCC(*b"resc")).unwrap();
    assert_eq!(doc.tree.get(resc).status, NodeStatus::Rejected(FindingKind::WrongContext));

    let jp2h = doc.tree.find(FourCC(*b"jp2h")).unwrap();
    let findings = &doc.tree.get(jp2h).findings;
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, FindingKind::WrongContext);
    assert_eq!(findings[0].box_type, Some(FourCC(*b"resc")));

    assert!(doc.metadata.is_empty());
    assert!(doc.properties.is_empty());
}

#[test]
fn top_level_resc_is_wrong_context() {
    let data = jp2_box(b"resc", &resc_body(100, 1, 100, 1, 2, 2));
    let doc = Decoder::new().decode_bytes(&data).unwrap();

    assert_eq!(doc.findings.len(), 1);
    assert_eq!(doc.findings[0].kind, FindingKind::WrongContext);
    assert!(doc.metadata.is_empty());
}

#[test]
fn leftover_body_bytes_are_a_structural_mismatch() {
    let mut body = resc_body(100, 1, 100, 1, 2, 2);
    body.extend_from_slice(&[0, 0]);
    let data = in_resolution(&body);
    let doc = Decoder::new().decode_bytes(&data).unwrap();

    let resc = doc.tree.find(FourCC(*b"resc")).unwrap();
    assert_eq!(
        doc.tree.get(resc).status,
        NodeStatus::Rejected(FindingKind::StructuralMismatch)
    );
    let res = doc.tree.find(FourCC(*b"res ")).unwrap();
    let f = &doc.tree.get(res).findings[0];
    assert_eq!(f.kind, FindingKind::StructuralMismatch);
    assert!(f.message.contains("declares 12"), "{}", f.message);
    assert!(f.message.contains("10 were consumed"), "{}", f.message);

    // calibration written during decode is rolled back
    assert!(doc.metadata.is_empty());
    assert!(doc.properties.is_empty());
}

#[test]
fn short_body_is_a_structural_mismatch() {
    let body = &resc_body(100, 1, 100, 1, 2, 2)[..8];
    let data = in_resolution(body);
    let doc = Decoder::new().decode_bytes(&data).unwrap();

    let resc = doc.tree.find(FourCC(*b"resc")).unwrap();
    assert_eq!(
        doc.tree.get(resc).status,
        NodeStatus::Rejected(FindingKind::StructuralMismatch)
    );
    assert!(!doc.truncated);
    assert!(doc.metadata.is_empty());
}

#[test]
fn zero_denominator_leaves_axis_uncalibrated() {
    let data = in_resolution(&resc_body(100, 0, 100, 1, 0, 0));
    let doc = Decoder::new().decode_bytes(&data).unwrap();

    let resc = doc.tree.find(FourCC(*b"resc")).unwrap();
    let node = doc.tree.get(resc);
    assert!(node.is_decoded());
    assert_eq!(node.findings.len(), 1);
    assert_eq!(node.findings[0].kind, FindingKind::InvalidValue);

    assert!(doc.metadata.y_sampling_frequency.is_none());
    assert!(doc.metadata.x_sampling_frequency.unwrap().is_identical(&Rational::new(100, 100).unwrap()));
    assert!(doc.property("CaptureResolution").is_some());
}

// Known edge case: exponent bytes are unsigned, so 0xFF is 10^255 rather
// than 10^-1 and overflows instead of producing a sub-unit resolution.
#[test]
fn exponent_byte_ff_is_not_negative_one() {
    let data = in_resolution(&resc_body(100, 1, 100, 1, 0xFF, 0));
    let doc = Decoder::new().decode_bytes(&data).unwrap();

    let resc = doc.tree.find(FourCC(*b"resc")).unwrap();
    let node = doc.tree.get(resc);
    assert_eq!(node.findings[0].kind, FindingKind::InvalidValue);
    assert!(doc.metadata.y_sampling_frequency.is_none());

    let vert = doc.property("CaptureResolution").unwrap().child("VertResolution").unwrap();
    assert_eq!(int(vert, "Exponent"), 255);
}

#[test]
fn display_resolution_does_not_touch_sampling_frequency() {
    let data = jp2_box(b"jp2h", &jp2_box(b"res ", &jp2_box(b"resd", &resc_body(72, 1, 72, 1, 0, 0))));
    let doc = Decoder::new().decode_bytes(&data).unwrap();

    assert!(doc.is_conformant());
    assert!(doc.property("DefaultDisplayResolution").is_some());
    assert!(doc.property("CaptureResolution").is_none());
    assert!(doc.metadata.is_empty());
}

proptest! {
    #[test]
    fn calibration_matches_emitted_properties(
        v_num in any::<u16>(), v_den in 1u16.., h_num in any::<u16>(), h_den in 1u16..,
        v_exp in 0u8..=14, h_exp in 0u8..=14,
    ) {
        let data = in_resolution(&resc_body(v_num, v_den, h_num, h_den, v_exp, h_exp));
        let doc = Decoder::new().decode_bytes(&data).unwrap();
        let cr = doc.property("CaptureResolution").unwrap();

        let recompute = |axis: &Property| {
            let scale = 10i64.pow(int(axis, "Exponent") as u32);
            Rational::new(int(axis, "Numerator") * scale, int(axis, "Denominator") * 100).unwrap()
        };
        let y = recompute(cr.child("VertResolution").unwrap());
        let x = recompute(cr.child("HorizResolution").unwrap());
        prop_assert!(doc.metadata.y_sampling_frequency.unwrap().is_identical(&y));
        prop_assert!(doc.metadata.x_sampling_frequency.unwrap().is_identical(&x));
    }
}
