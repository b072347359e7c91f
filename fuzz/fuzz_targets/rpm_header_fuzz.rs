#![no_main]
use drpm::rpm::Header;
use drpm::rpm::header::tags;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = Header::read_from(&mut &data[..], "fuzz header") {
        let _ = header.string(tags::NAME);
        let _ = header.u32(tags::EPOCH);
    }
});
