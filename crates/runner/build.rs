//! Build script for SoftDeck
//! Embeds Windows resource metadata

fn main() {
    #[cfg(windows)]
    {
        let mut res = winresource::WindowsResource::new();
        res.set("FileDescription", "SoftDeck");
        res.set("ProductName", "SoftDeck");
        res.set("InternalName", "SoftDeck");
        res.set("OriginalFilename", "SoftDeck.exe");
        res.set("CompanyName", "SoftDeck");
        res.set("LegalCopyright", "Copyright © 2026");

        if let Err(e) = res.compile() {
            println!("cargo:warning=Failed to compile Windows resources: {}", e);
        }
    }
}
