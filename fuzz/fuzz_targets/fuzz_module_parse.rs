#![no_main]

use libfuzzer_sys::fuzz_target;
use exeicon::{extract_first_group, Module, ResourceStore, ResourceType};

fuzz_target!(|data: &[u8]| {
    // Malformed images must produce errors, never panics
    let Ok(module) = Module::from_slice(data) else {
        return;
    };
    if let Ok(names) = module.names(ResourceType::GroupIcon) {
        for name in names.take(16) {
            let _ = module.lookup(ResourceType::GroupIcon, &name);
        }
    }
    let _ = extract_first_group(&module, true);
    let _ = extract_first_group(&module, false);
});
