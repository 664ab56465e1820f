//! Assembles raw class files byte by byte, so tests can exercise the
//! reader without fixture files on disk.

pub const MAJOR: u16 = 61;

#[derive(Default)]
pub struct Assembler {
    pool: Vec<u8>,
    slots: u16,
    methods: Vec<u8>,
    method_count: u16,
    this_class: Option<u16>,
    super_class: Option<u16>,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            slots: 1,
            ..Self::default()
        }
    }

    fn push(&mut self, entry: &[u8], wide: bool) -> u16 {
        let index = self.slots;
        self.pool.extend_from_slice(entry);
        self.slots += if wide { 2 } else { 1 };
        index
    }

    pub fn utf8(&mut self, text: &str) -> u16 {
        let mut entry = vec![1u8];
        entry.extend_from_slice(&(text.len() as u16).to_be_bytes());
        entry.extend_from_slice(text.as_bytes());
        self.push(&entry, false)
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        let mut entry = vec![3u8];
        entry.extend_from_slice(&value.to_be_bytes());
        self.push(&entry, false)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut entry = vec![5u8];
        entry.extend_from_slice(&value.to_be_bytes());
        self.push(&entry, true)
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        let mut entry = vec![7u8];
        entry.extend_from_slice(&name_index.to_be_bytes());
        self.push(&entry, false)
    }

    pub fn string(&mut self, text: &str) -> u16 {
        let utf8_index = self.utf8(text);
        let mut entry = vec![8u8];
        entry.extend_from_slice(&utf8_index.to_be_bytes());
        self.push(&entry, false)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let mut entry = vec![12u8];
        entry.extend_from_slice(&name_index.to_be_bytes());
        entry.extend_from_slice(&descriptor_index.to_be_bytes());
        self.push(&entry, false)
    }

    pub fn field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.child_ref(9, class, name, descriptor)
    }

    pub fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        self.child_ref(10, class, name, descriptor)
    }

    fn child_ref(&mut self, tag: u8, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(class);
        let name_and_type_index = self.name_and_type(name, descriptor);

        let mut entry = vec![tag];
        entry.extend_from_slice(&class_index.to_be_bytes());
        entry.extend_from_slice(&name_and_type_index.to_be_bytes());
        self.push(&entry, false)
    }

    pub fn this_class(&mut self, name: &str) {
        let index = self.class(name);
        self.this_class = Some(index);
    }

    pub fn super_class(&mut self, name: &str) {
        let index = self.class(name);
        self.super_class = Some(index);
    }

    /// Encodes one attribute: interned name, declared length, body.
    pub fn attribute(&mut self, name: &str, body: &[u8]) -> Vec<u8> {
        let name_index = self.utf8(name);

        let mut out = Vec::new();
        out.extend_from_slice(&name_index.to_be_bytes());
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    pub fn code_attribute(&mut self, max_stack: u16, max_locals: u16, code: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&max_stack.to_be_bytes());
        body.extend_from_slice(&max_locals.to_be_bytes());
        body.extend_from_slice(&(code.len() as u32).to_be_bytes());
        body.extend_from_slice(code);
        body.extend_from_slice(&0u16.to_be_bytes()); // exception table
        body.extend_from_slice(&0u16.to_be_bytes()); // nested attributes

        self.attribute("Code", &body)
    }

    pub fn method(&mut self, flags: u16, name: &str, descriptor: &str, attributes: &[Vec<u8>]) {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);

        self.methods.extend_from_slice(&flags.to_be_bytes());
        self.methods.extend_from_slice(&name_index.to_be_bytes());
        self.methods
            .extend_from_slice(&descriptor_index.to_be_bytes());
        self.methods
            .extend_from_slice(&(attributes.len() as u16).to_be_bytes());
        for attribute in attributes {
            self.methods.extend_from_slice(attribute);
        }

        self.method_count += 1;
    }

    pub fn finish(mut self) -> Vec<u8> {
        let this_class = match self.this_class {
            Some(index) => index,
            None => self.class("Test"),
        };
        let super_class = match self.super_class {
            Some(index) => index,
            None => self.class("java/lang/Object"),
        };

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&MAJOR.to_be_bytes());
        out.extend_from_slice(&self.slots.to_be_bytes());
        out.extend_from_slice(&self.pool);
        out.extend_from_slice(&0x0021u16.to_be_bytes()); // public super
        out.extend_from_slice(&this_class.to_be_bytes());
        out.extend_from_slice(&super_class.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
        out.extend_from_slice(&0u16.to_be_bytes()); // fields
        out.extend_from_slice(&self.method_count.to_be_bytes());
        out.extend_from_slice(&self.methods);
        out.extend_from_slice(&0u16.to_be_bytes()); // class attributes
        out
    }
}
