fn main() {
    // ESP-IDF builds need the sysenv exported by embuild so the linker
    // finds the IDF libraries.  Host builds have nothing to do.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
