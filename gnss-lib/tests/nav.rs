use gnss::bits::BitWriter;
use gnss::framing::decode_one;
use gnss::nav::glonass::{self, String4};
use gnss::nav::gps::{self, Page, Subframe4};
use gnss::nav::Constellation;
use gnss::ubx::{self, RxmSfrbx, Ubx};
use gnss::Error;
use test_case::test_case;

/// Ten 30-bit words carrying `sf`, with the parity bits set to ones.
fn to_words(sf: &[u8; gps::SUBFRAME_LEN]) -> Vec<u32> {
    sf.chunks(3)
        .map(|c| (u32::from(c[0]) << 16 | u32::from(c[1]) << 8 | u32::from(c[2])) << 6 | 0x3f)
        .collect()
}

fn iono_page() -> [u8; gps::SUBFRAME_LEN] {
    let mut sf = [0u8; gps::SUBFRAME_LEN];
    let mut w = BitWriter::new(&mut sf);
    w.unsigned(8, gps::PREAMBLE.into()).unwrap();
    let mut w = BitWriter::at(&mut sf, 24);
    w.unsigned(17, 1000).unwrap();
    w.skip(2).unwrap();
    w.unsigned(3, 4).unwrap();
    let mut w = BitWriter::at(&mut sf, 48);
    w.unsigned(2, 1).unwrap();
    w.unsigned(6, 56).unwrap();
    sf
}

#[test]
fn sfrbx_to_iono_utc_page() {
    let sfrbx = RxmSfrbx {
        gnss_id: RxmSfrbx::GNSS_GPS,
        sv_id: 21,
        version: 2,
        words: to_words(&iono_page()),
        ..RxmSfrbx::default()
    };
    let dat = ubx::serialize(&sfrbx).unwrap();
    let frame = decode_one(Ubx::default(), &dat).unwrap();
    let msg = ubx::decode(&frame).unwrap();
    let sfrbx = msg.downcast_ref::<RxmSfrbx>().unwrap();

    let nav = sfrbx.nav_data().unwrap();
    assert_eq!(nav.constellation(), Constellation::Gps);
    assert_eq!(nav.number(), 4);
    let sf4 = nav.downcast_ref::<Subframe4>().unwrap();
    assert_eq!(sf4.header.tow_seconds(), 6000);
    assert_eq!(sf4.sv_id, 56);
    assert!(matches!(sf4.page, Page::IonoUtc(_)));
}

#[test]
fn sfrbx_to_glonass_string() {
    let mut string = [0u8; glonass::STRING_LEN];
    let mut w = BitWriter::at(&mut string, 1);
    w.unsigned(4, 4).unwrap();
    let mut w = BitWriter::at(&mut string, 70);
    w.unsigned(5, 9).unwrap();

    let mut words: Vec<u32> = string
        .chunks(4)
        .map(|c| {
            let mut b = [0u8; 4];
            b[..c.len()].copy_from_slice(c);
            u32::from_be_bytes(b)
        })
        .collect();
    words.push(0);
    let sfrbx = RxmSfrbx {
        gnss_id: RxmSfrbx::GNSS_GLONASS,
        freq_id: 8,
        words,
        ..RxmSfrbx::default()
    };

    let nav = sfrbx.nav_data().unwrap();
    assert_eq!(nav.constellation(), Constellation::Glonass);
    assert_eq!(nav.downcast_ref::<String4>().unwrap().n, 9);
}

#[test_case(0 ; "zero")]
#[test_case(6 ; "six")]
#[test_case(7 ; "seven")]
fn invalid_subframe_id(id: u64) {
    let mut sf = iono_page();
    BitWriter::at(&mut sf, 43).unsigned(3, id).unwrap();
    assert!(matches!(
        gps::decode_subframe(&sf),
        Err(Error::StructureMismatch(_))
    ));
}

#[test]
fn bad_preamble() {
    let mut sf = iono_page();
    sf[0] = 0x8a;
    assert!(matches!(
        gps::decode_subframe(&sf),
        Err(Error::StructureMismatch(_))
    ));
}

#[test]
fn short_units() {
    assert!(matches!(
        gps::decode_subframe(&iono_page()[..29]),
        Err(Error::TruncatedInput { .. })
    ));
    assert!(matches!(
        glonass::decode_string(&[0x20; 10]),
        Err(Error::TruncatedInput { .. })
    ));
}

#[test]
fn registries_cover_all_numbers() {
    assert_eq!(gps::registry().len(), 5);
    assert_eq!(glonass::registry().len(), 15);
}
