#![no_main]

use libfuzzer_sys::fuzz_target;
use exeicon::{build_container, Error, ExtractedImage, GroupIconDirectory, IconDirectory};

fuzz_target!(|data: &[u8]| {
    let Ok(group) = GroupIconDirectory::parse(data) else {
        return;
    };

    // Use the descriptor bytes themselves as every image payload
    let images: Vec<ExtractedImage<'_>> = group
        .entries
        .iter()
        .map(|entry| ExtractedImage {
            entry: *entry,
            data,
        })
        .collect();
    if images.is_empty() {
        return;
    }

    let ico = match build_container(&group.header, &images) {
        Ok(ico) => ico,
        // Large inputs legitimately overflow the 32-bit offsets
        Err(Error::ContainerTooLarge(_)) => return,
        Err(e) => panic!("unexpected error: {e}"),
    };
    let dir = IconDirectory::parse(&ico).expect("container parses");
    assert_eq!(dir.entries.len(), images.len());
    for i in 0..images.len() {
        assert_eq!(dir.image(&ico, i), Some(data));
    }
});
