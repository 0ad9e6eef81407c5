/// Integration tests for atrmanager

use atrmanager::*;
use proptest::prelude::*;
use std::io::Cursor;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory disk image under construction
struct Fixture {
    data: Vec<u8>,
    sector_size: usize,
    boot_sectors: usize,
}

impl Fixture {
    /// 720 x 128 byte XFD with a DOS 2 VTOC
    fn single_density() -> Self {
        Self::blank(92_160, 128, 0).vtoc(2, 707, 707)
    }

    /// 3 x 128 + 717 x 256 byte XFD with a DOS 2 VTOC
    fn double_density_short_boot() -> Self {
        Self::blank(183_936, 256, 3).vtoc(2, 707, 707)
    }

    fn blank(size: usize, sector_size: usize, boot_sectors: usize) -> Self {
        Self {
            data: vec![0u8; size],
            sector_size,
            boot_sectors,
        }
    }

    fn offset(&self, sector: u16) -> usize {
        let n = sector as usize - 1;
        if n < self.boot_sectors {
            n * 128
        } else {
            self.boot_sectors * 128 + (n - self.boot_sectors) * self.sector_size
        }
    }

    fn sector_mut(&mut self, sector: u16) -> &mut [u8] {
        let offset = self.offset(sector);
        let size = if (sector as usize) <= self.boot_sectors {
            128
        } else {
            self.sector_size
        };
        &mut self.data[offset..offset + size]
    }

    fn vtoc(mut self, code: u8, total: u16, free: u16) -> Self {
        let vtoc = self.sector_mut(360);
        vtoc[0] = code;
        vtoc[1..3].copy_from_slice(&total.to_le_bytes());
        vtoc[3..5].copy_from_slice(&free.to_le_bytes());
        self
    }

    /// Directory flag byte of a slot
    fn entry_flag(&mut self, index: usize) -> u8 {
        let sector = 361 + (index / 8) as u16;
        self.sector_mut(sector)[(index % 8) * 16]
    }

    /// Place an entry, marking any unused slots before it as deleted so the
    /// directory scan reaches it
    fn entry(mut self, index: usize, flag: u8, count: u16, start: u16, name: &[u8; 11]) -> Self {
        for slot in 0..index {
            if self.entry_flag(slot) == 0 {
                self = self.record(slot, DirFlags::DELETED, 0, 0, b"           ");
            }
        }
        self.record(index, flag, count, start, name)
    }

    /// Write a raw directory record
    fn record(mut self, index: usize, flag: u8, count: u16, start: u16, name: &[u8; 11]) -> Self {
        let sector = 361 + (index / 8) as u16;
        let offset = (index % 8) * 16;
        let record = &mut self.sector_mut(sector)[offset..offset + 16];
        record[0] = flag;
        record[1..3].copy_from_slice(&count.to_le_bytes());
        record[3..5].copy_from_slice(&start.to_le_bytes());
        record[5..16].copy_from_slice(name);
        self
    }

    fn dos2_sector(mut self, sector: u16, file_num: u8, next: u16, payload: &[u8]) -> Self {
        let data = self.sector_mut(sector);
        let len = data.len();
        data[..payload.len()].copy_from_slice(payload);
        data[len - 3] = (file_num << 2) | ((next >> 8) as u8 & 0x03);
        data[len - 2] = (next & 0xFF) as u8;
        data[len - 1] = payload.len() as u8;
        self
    }

    /// Chain `payloads` through consecutive sectors from `start`
    fn dos2_file(mut self, file_num: u8, start: u16, payloads: &[Vec<u8>]) -> Self {
        for (i, payload) in payloads.iter().enumerate() {
            let sector = start + i as u16;
            let next = if i + 1 == payloads.len() { 0 } else { sector + 1 };
            self = self.dos2_sector(sector, file_num, next, payload);
        }
        self
    }

    fn xfd(self) -> Vec<u8> {
        self.data
    }

    fn atr(self) -> Vec<u8> {
        let mut image = atr_header(self.data.len() as u64, self.sector_size as u16).to_vec();
        image.extend(self.data);
        image
    }

    fn open(self) -> AtrImage<Cursor<Vec<u8>>> {
        AtrImage::from_bytes(self.xfd()).expect("Failed to open image")
    }
}

fn atr_header(declared: u64, sector_size: u16) -> [u8; 16] {
    let paragraphs = declared / 16;
    let mut header = [0u8; 16];
    header[0..2].copy_from_slice(&0x0296u16.to_le_bytes());
    header[2..4].copy_from_slice(&((paragraphs & 0xFFFF) as u16).to_le_bytes());
    header[4..6].copy_from_slice(&sector_size.to_le_bytes());
    header[6] = (paragraphs >> 16) as u8;
    header
}

#[test]
fn test_single_density_hello() {
    init_logging();
    let image = Fixture::single_density()
        .entry(0, 0x42, 1, 400, b"HELLO   TXT")
        .dos2_sector(400, 0, 0, b"HELLO")
        .open();

    assert_eq!(image.entries().len(), 1);
    let entry = &image.entries()[0];
    assert_eq!(entry.filename(), "HELLO.TXT");
    assert_eq!(image.read_file(entry).expect("Failed to read file"), b"HELLO");
    assert!(image.all_sane());
}

#[test]
fn test_atr_header_size_mismatch() {
    init_logging();
    let mut bytes = atr_header(100_000, 128).to_vec();
    bytes.extend(vec![0u8; 92_160]);
    assert_eq!(bytes.len(), 92_176);

    let result = AtrImage::from_bytes(bytes);
    assert!(matches!(
        result,
        Err(AtrError::HeaderMismatch {
            declared: 100_000,
            actual: 92_160
        })
    ));
}

#[test]
fn test_atr_header_size_mismatch_tolerated() {
    init_logging();
    let mut bytes = atr_header(100_000, 128).to_vec();
    bytes.extend(Fixture::single_density().xfd());

    let options = OpenOptions::new().strict_size(false);
    let image = AtrImage::open_with(Cursor::new(bytes), options).expect("Failed to open image");
    assert_eq!(image.header().image_byte_size, 92_160);
}

#[test]
fn test_file_number_mismatch() {
    init_logging();
    let image = Fixture::single_density()
        .entry(3, 0x42, 1, 400, b"WRONG   NUM")
        .dos2_sector(400, 0, 0, b"DATA")
        .open();

    // deleted slots 0..3 are skipped, not treated as the end of the directory
    assert_eq!(image.entries().len(), 1);
    let entry = image.find("WRONG.NUM").expect("Failed to find entry");
    assert_eq!(entry.file_num, 3);

    let err = image.read_file(entry).unwrap_err();
    assert_eq!(err.bytes_read, 0);
    assert!(matches!(
        err.source,
        AtrError::FileNumberMismatch {
            expected: 3,
            found: 0
        }
    ));
}

#[test]
fn test_mydos_file_crossing_vtoc() {
    init_logging();
    let layout = SectorLayout {
        header_offset: 0,
        initial_sector_size: 128,
        num_initial_sectors: 0,
        main_sector_size: 128,
        image_byte_size: 92_160,
    };
    let device = SectorDevice::new(Cursor::new(vec![0u8; 92_160]), layout);
    let vtoc = Vtoc {
        code: 0,
        total_sectors: 707,
        unused_sectors: 0,
        first_vtoc: 355,
    };

    let mut record = [0x20u8; 16];
    record[0] = 0x46;
    record[1..3].copy_from_slice(&10u16.to_le_bytes());
    record[3..5].copy_from_slice(&354u16.to_le_bytes());
    let entry = DirEntry::parse(0, &record).expect("Failed to parse entry");
    assert_eq!(entry.dialect(), Dialect::MyDos);

    let sectors: Vec<u16> = FileReader::new(&device, &entry, &vtoc)
        .map(|s| s.expect("Failed to read sector").sector)
        .collect();
    assert_eq!(
        sectors,
        vec![354, 369, 370, 371, 372, 373, 374, 375, 376, 377]
    );
}

#[test]
fn test_directory_terminator() {
    init_logging();
    let mut fixture = Fixture::single_density();
    for i in 0..5 {
        fixture = fixture.entry(i, 0x42, 1, 400 + i as u16, b"FILE    DAT");
    }
    // everything after the terminator is garbage
    for sector in 361..=368u16 {
        let data = fixture.sector_mut(sector);
        for (i, byte) in data.iter_mut().enumerate() {
            if sector > 361 || i >= 6 * 16 {
                *byte = 0xC3;
            }
        }
    }
    let image = fixture.open();

    assert_eq!(image.entries().len(), 5);
    assert!(image.all_sane());
    assert!(image.entries().iter().all(|e| e.flags.0 == 0x42));
}

#[test]
fn test_empty_file() {
    init_logging();
    let image = Fixture::single_density()
        .entry(1, 0x42, 1, 400, b"EMPTY      ")
        .dos2_sector(400, 1, 0, b"")
        .open();

    let data = image.read_file_by_name("EMPTY").expect("Failed to read file");
    assert!(data.is_empty());
}

#[test]
fn test_blank_directory() {
    init_logging();
    let image = Fixture::single_density().open();
    assert!(image.entries().is_empty());
    assert!(image.diagnostics().is_empty());
}

#[test]
fn test_first_entry_flag_zero() {
    init_logging();
    let image = Fixture::single_density()
        .record(1, 0x42, 1, 400, b"HIDDEN  TXT")
        .open();
    assert!(image.entries().is_empty());
}

#[test]
fn test_single_sector_file_ends_on_zero_link() {
    init_logging();
    let image = Fixture::single_density()
        .entry(0, 0x42, 1, 400, b"ONE     SEC")
        .dos2_sector(400, 0, 0, &[0xAA; 125])
        .open();

    let entry = image.find("ONE.SEC").expect("Failed to find entry");
    let sectors: Vec<FileSector> = image
        .file_reader(entry)
        .expect("Failed to create reader")
        .collect::<Result<_>>()
        .expect("Failed to read file");
    assert_eq!(sectors.len(), 1);
    assert_eq!(sectors[0].sector, 400);
    assert_eq!(sectors[0].data.len(), 125);
}

#[test]
fn test_file_starting_on_last_usable_sector() {
    init_logging();
    let image = Fixture::single_density()
        .entry(0, 0x42, 1, 707, b"LAST    SEC")
        .dos2_sector(707, 0, 0, b"END")
        .open();

    assert!(image.all_sane());
    assert_eq!(image.read_file_by_name("LAST.SEC").expect("Failed to read file"), b"END");
}

#[test]
fn test_multi_sector_file() {
    init_logging();
    let payloads = vec![vec![0x11; 125], vec![0x22; 125], vec![0x33; 40]];
    let image = Fixture::single_density()
        .entry(2, 0x42, 3, 500, b"GAME    XEX")
        .dos2_file(2, 500, &payloads)
        .open();

    let data = image.read_file_by_name("GAME.XEX").expect("Failed to read file");
    assert_eq!(data, payloads.concat());
}

#[test]
fn test_partial_read_reports_bytes() {
    init_logging();
    let image = Fixture::single_density()
        .entry(2, 0x42, 2, 500, b"BROKEN     ")
        .dos2_sector(500, 2, 501, &[0x11; 100])
        .dos2_sector(501, 9, 0, &[0x22; 10])
        .open();

    let err = image.read_file_by_name("BROKEN").unwrap_err();
    assert!(matches!(
        err,
        AtrError::FileNumberMismatch {
            expected: 2,
            found: 9
        }
    ));

    let entry = image.find("BROKEN").expect("Failed to find entry");
    let err = image.read_file(entry).unwrap_err();
    assert_eq!(err.bytes_read, 100);
    assert_eq!(err.to_string(), format!("{} (after 100 bytes)", err.source));
}

#[test]
fn test_atr_double_density_short_boot() {
    init_logging();
    let bytes = Fixture::double_density_short_boot()
        .entry(0, 0x42, 1, 400, b"BIG     DAT")
        .dos2_sector(400, 0, 0, &[0x5A; 253])
        .atr();
    assert_eq!(bytes.len(), 183_952);

    let image = AtrImage::from_bytes(bytes).expect("Failed to open image");
    assert_eq!(image.header().format, ImageFormat::Atr);
    assert_eq!(image.header().boot_sectors, 3);
    assert_eq!(image.layout().sector_count(), 720);
    assert_eq!(image.read_sector(1).expect("Failed to read sector").len(), 128);
    assert_eq!(image.read_sector(4).expect("Failed to read sector").len(), 256);
    assert_eq!(
        image.read_file_by_name("BIG.DAT").expect("Failed to read file"),
        vec![0x5A; 253]
    );
}

#[test]
fn test_unknown_xfd_size() {
    init_logging();
    let result = AtrImage::from_bytes(vec![0u8; 90_000]);
    assert!(matches!(result, Err(AtrError::UnknownImageSize(90_000))));
}

#[test]
fn test_listing() {
    init_logging();
    let image = Fixture::single_density()
        .entry(0, 0x42, 1, 400, b"HELLO   TXT")
        .dos2_sector(400, 0, 0, b"HELLO")
        .open();

    let listing = image.listing();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("XFD Disk Image (size=92160 (720x128B))"));
    assert!(lines[0].ends_with("707 usable sectors (707 free), 1 files"));
    assert!(lines[1].starts_with("File #0 "));
}

#[test]
fn test_xex_from_disk() {
    init_logging();
    let mut xex = vec![0xFF, 0xFF, 0x00, 0x20, 0x02, 0x20, 0xA9, 0x00, 0x60];
    xex.extend([0xE0, 0x02, 0xE1, 0x02, 0x00, 0x20]);

    let image = Fixture::single_density()
        .entry(0, 0x42, 1, 400, b"PROG    XEX")
        .dos2_sector(400, 0, 0, &xex)
        .open();

    let data = image.read_file_by_name("PROG.XEX").expect("Failed to read file");
    let segments = xex::parse_segments(&data).expect("Failed to parse segments");
    assert_eq!(segments.len(), 2);
    assert_eq!(xex::run_address(&segments), Some(0x2000));
}

#[test]
fn test_device_covers_image() {
    init_logging();
    for bytes in [
        Fixture::single_density().xfd(),
        Fixture::double_density_short_boot().xfd(),
        Fixture::double_density_short_boot().atr(),
    ] {
        let image = AtrImage::from_bytes(bytes).expect("Failed to open image");
        let summary = image.summary();
        let header = image.header();
        assert!(
            summary.device_sectors as u64 * header.sector_size as u64 >= header.image_byte_size
        );
    }
}

fn payloads_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 1..=125), 1..=12)
}

proptest! {
    #[test]
    fn prop_read_is_bounded_and_repeatable(
        file_num in 0u8..64,
        payloads in payloads_strategy(),
    ) {
        let count = payloads.len() as u16;
        let bytes = Fixture::single_density()
            .entry(file_num as usize, 0x42, count, 400, b"PROP    DAT")
            .dos2_file(file_num, 400, &payloads)
            .xfd();

        let first = AtrImage::from_bytes(bytes.clone()).unwrap();
        let entry = first.find("PROP.DAT").unwrap().clone();
        let data = first.read_file(&entry).unwrap();
        prop_assert!(data.len() <= entry.num_sectors as usize * 128);
        prop_assert_eq!(&data, &payloads.concat());

        let second = AtrImage::from_bytes(bytes).unwrap();
        let again = second.read_file_by_name("PROP.DAT").unwrap();
        prop_assert_eq!(data, again);
    }

    #[test]
    fn prop_trailer_corruption_detected(
        file_num in 0u8..64,
        payloads in payloads_strategy(),
        target in any::<prop::sample::Index>(),
        byte in 0usize..3,
        mask in 1u8..=255,
    ) {
        let count = payloads.len() as u16;
        let mut fixture = Fixture::single_density()
            .entry(file_num as usize, 0x42, count, 400, b"PROP    DAT")
            .dos2_file(file_num, 400, &payloads);

        let sector = 400 + target.index(payloads.len()) as u16;
        fixture.sector_mut(sector)[125 + byte] ^= mask;

        let image = AtrImage::from_bytes(fixture.xfd()).unwrap();
        let entry = image.find("PROP.DAT").expect("Failed to find entry");
        match image.read_file(entry) {
            Ok(data) => prop_assert_ne!(data, payloads.concat()),
            Err(err) => prop_assert!(
                matches!(
                    err.source,
                    AtrError::FileNumberMismatch { .. }
                        | AtrError::SectorCountExceeded { .. }
                        | AtrError::BadByteCount { .. }
                        | AtrError::SectorLoop { .. }
                        | AtrError::FileTooLong { .. }
                        | AtrError::SectorOutOfRange { .. }
                ),
                "unexpected error: {}",
                err
            ),
        }
    }

    #[test]
    fn prop_mydos_skips_vtoc_region(
        before in 1u16..=3,
        count in 1u16..=20,
    ) {
        // code 3 places the VTOC at 358..=360
        let start = 358 - before;
        let image = Fixture::single_density()
            .vtoc(3, 1000, 900)
            .entry(0, 0x46, count, start, b"SPAN       ")
            .open();

        let vtoc = *image.vtoc();
        prop_assert_eq!(vtoc.first_vtoc, 358);

        let entry = image.find("SPAN").unwrap();
        let sectors: Vec<u16> = image
            .file_reader(entry)
            .unwrap()
            .map(|s| s.unwrap().sector)
            .collect();
        prop_assert_eq!(sectors.len(), count as usize);

        for pair in sectors.windows(2) {
            let step = pair[1] - pair[0];
            if pair[1] == vtoc.first_data_after_vtoc() {
                prop_assert_eq!(pair[0] + 1, vtoc.first_vtoc);
                prop_assert_eq!(step - 1, vtoc.first_data_after_vtoc() - vtoc.first_vtoc);
            } else {
                prop_assert_eq!(step, 1);
            }
        }
    }

    #[test]
    fn prop_canonical_name_round_trip(
        name in "[A-Z][A-Z0-9]{0,7}",
        ext in "[A-Z0-9]{0,3}",
    ) {
        let mut raw = [b' '; 11];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        raw[8..8 + ext.len()].copy_from_slice(ext.as_bytes());

        let image = Fixture::single_density()
            .entry(0, 0x42, 1, 400, &raw)
            .dos2_sector(400, 0, 0, b"X")
            .open();

        let entry = &image.entries()[0];
        let canonical = entry.filename();
        let found = image.find(&canonical).unwrap();
        prop_assert_eq!(found.filename(), canonical);
    }
}
