#![no_main]

use structser_mutator::{product, structured_fuzz_target, sum};

sum! {
    #[derive(Debug, Clone, PartialEq)]
    enum Field {
        Number { value: i32 },
        Name { value: String },
        Children { records: Vec<(u8, String)> },
    }
}

product! {
    #[derive(Debug, Clone, PartialEq)]
    struct Record {
        id: u32,
        fields: Vec<Field>,
    }
}

fn check(record: &Record) {
    // A toy target: only records with a deep enough structure hit the inner branch
    if record.id == 0x5354_5255 {
        for field in &record.fields {
            if let Field::Children { records } = field {
                if records.iter().any(|(depth, name)| *depth > 200 && name == "leaf") {
                    panic!("reached the structured branch");
                }
            }
        }
    }
}

structured_fuzz_target!(|record: &Record| {
    check(record);
});
