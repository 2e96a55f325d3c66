fn main() {
    setfsuid_conformance::setfsuid04_main()
}
