#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use storage_access::iam::{get_policy_attributes, Policy, PolicyResolver};

#[derive(Arbitrary, Debug)]
struct Input {
    rules: Vec<String>,
    key: String,
    make_public: bool,
}

fuzz_target!(|input: Input| {
    let attrs = get_policy_attributes(&input.rules, &input.key);
    if attrs.policy == Policy::Private {
        assert!(attrs.can_change_policy);
    }

    // Editing either fails cleanly or leaves the key with the requested policy
    let Ok(mut resolver) = PolicyResolver::new(input.rules.clone()) else {
        return;
    };
    let wanted = if input.make_public { Policy::Public } else { Policy::Private };
    if resolver.set_policy(&input.key, wanted).is_ok() && input.make_public {
        assert!(resolver.check_is_public(&input.key));
    }
});
