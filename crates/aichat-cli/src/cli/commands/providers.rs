//! Providers command handler.

use aichat_core::providers::Provider;

pub fn list(default: Provider) {
    for provider in Provider::all() {
        let marker = if *provider == default { " (default)" } else { "" };
        println!("{:<8} {}{marker}", provider.id(), provider.label());
    }
}
