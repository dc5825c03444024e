//! Messages produced by `openssl cms -sign`.

use cms_signed::{
    oid::{ID_DATA, ID_SHA256, RSA_ENCRYPTION},
    CmsVersion, Error, SignatureAlgorithm, SignedData, SignerIdentifier,
};
use hex_literal::hex;
use x509_cert::{der::DecodePem, time::Time, Certificate};

const MESSAGE: &[u8] = include_bytes!("examples/message.txt");

fn cert(pem: &str) -> Certificate {
    Certificate::from_pem(pem).unwrap()
}

// `-keyid -stream`: indefinite lengths, constructed eContent, signer by key identifier
#[cfg(feature = "p256")]
#[test]
fn ber_with_key_identifier() {
    let ber = include_bytes!("examples/p256-keyid-ber.p7m");
    let sd = SignedData::from_ber(ber).unwrap();
    assert_eq!(sd.version, CmsVersion::V3);
    assert_eq!(sd.encap_content_info.econtent_type, ID_DATA);
    assert_eq!(sd.encap_content_info.econtent_value().unwrap().unwrap(), MESSAGE);
    assert_eq!(
        sd.encap_content_info.data_econtent_value().unwrap().unwrap(),
        MESSAGE
    );

    let signer = &sd.signer_infos[0];
    assert_eq!(signer.version, CmsVersion::V3);
    assert_eq!(
        signer.sid().unwrap(),
        SignerIdentifier::SubjectKeyIdentifier(
            hex!("06FF265B93466D8669CDEFD0EB3E9BCDCCC6A1AD").to_vec()
        )
    );
    assert_eq!(signer.x509_signature_algorithm(), SignatureAlgorithm::EcdsaWithSha256);

    let signers = sd.verify().unwrap();
    assert_eq!(signers, vec![cert(include_str!("examples/p256.crt"))]);

    // re-encoded as DER, the message still verifies
    let der = sd.content_info_der().unwrap();
    assert_ne!(&der[..], &ber[..]);
    let reparsed = SignedData::from_ber(&der).unwrap();
    assert_eq!(reparsed, sd);
    assert_eq!(reparsed.verify().unwrap(), signers);
}

// `-nosmimecap -md sha256` with an RSA leaf and its CA
#[cfg(feature = "rsa")]
#[test]
fn der_with_rsa_encryption() {
    let der = include_bytes!("examples/rsa-der.p7m");
    let sd = SignedData::from_ber(der).unwrap();
    assert_eq!(sd.version, CmsVersion::V1);
    assert_eq!(sd.digest_algorithms.len(), 1);
    assert_eq!(sd.digest_algorithms[0].oid, ID_SHA256);

    let certs = sd.x509_certificates().unwrap().unwrap();
    assert_eq!(certs.len(), 2);
    let leaf = cert(include_str!("examples/rsa2048.crt"));
    assert!(certs.contains(&leaf));
    assert!(certs.contains(&cert(include_str!("examples/ca-p256.crt"))));

    let signer = &sd.signer_infos[0];
    assert_eq!(signer.signature_algorithm.oid, RSA_ENCRYPTION);
    assert_eq!(signer.x509_signature_algorithm(), SignatureAlgorithm::Sha256WithRsa);
    assert_eq!(signer.find_certificate(&certs).unwrap(), &leaf);
    assert_eq!(signer.content_type_attribute().unwrap(), ID_DATA);
    assert_eq!(
        signer.message_digest_attribute().unwrap(),
        hex!("f1bccaa86aa53638f6c2455ec395c8f23291b72126df83a607b7a6ce6c9b1f68")
    );

    assert_eq!(sd.verify().unwrap(), vec![leaf]);
}

#[cfg(feature = "p384")]
#[test]
fn detached_p384() {
    let der = include_bytes!("examples/p384-detached.p7m");
    let sd = SignedData::from_ber(der).unwrap();
    assert!(sd.encap_content_info.is_detached());
    assert_eq!(sd.encap_content_info.econtent_value().unwrap(), None);
    assert!(matches!(sd.verify(), Err(Error::Detached)));

    let signers = sd.verify_detached(MESSAGE).unwrap();
    assert_eq!(signers, vec![cert(include_str!("examples/p384.crt"))]);
    assert!(matches!(
        sd.verify_detached(b"Hello CMS!\n"),
        Err(Error::DigestMismatch)
    ));

    let signing_time = sd.signer_infos[0].signing_time_attribute().unwrap();
    assert!(matches!(signing_time, Some(Time::UtcTime(_))));
}

#[test]
fn trailing_data() {
    let mut der = include_bytes!("examples/rsa-der.p7m").to_vec();
    der.extend_from_slice(&[0x00, 0x00]);
    assert!(matches!(SignedData::from_ber(&der), Err(Error::TrailingData)));
}

#[test]
fn truncated() {
    let ber = include_bytes!("examples/p256-keyid-ber.p7m");
    for len in [0, 1, 2, 40, ber.len() - 2] {
        assert!(SignedData::from_ber(&ber[..len]).is_err(), "length {}", len);
    }
}
