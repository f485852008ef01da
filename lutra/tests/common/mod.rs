use lutra::{doc, Client, Collection, Document};

#[ctor::ctor]
fn init_logger() {
    colog::init();
}

/// Zero-pads a number into a 24-character hex id, the caller-supplied id
/// shape the bindings use.
pub fn gen_id(num: usize) -> String {
    format!("{:024}", num)
}

/// Builds the standard 100-document corpus: counts 0..100 with string,
/// float, boolean, array and nested-document projections of the count.
pub fn test_docs() -> Vec<Document> {
    (0..100usize)
        .map(|num| {
            let n = num as i64;
            let mut doc = doc! {
                count: n,
                countStr: (num.to_string()),
                countFloat: (n as f64 + 0.1),
                countBool: (num & 1 == 1),
                countArray: [n, (n + 1), (n + 2), (n + 3), (n + 4)],
                countDict: {
                    odd: (num & 1 == 1),
                    even: (num & 1 == 0),
                    three: (num % 3 == 0),
                    five: (num % 5 == 0),
                },
                mixedDict: {
                    count: n,
                    countStr: (num.to_string()),
                    countArray: [n, (n + 1), (n + 2), (n + 3), (n + 4)],
                },
            };
            doc.put("_id", gen_id(num).as_str()).expect("valid id");
            doc
        })
        .collect()
}

/// Opens an in-memory client and returns a collection seeded with
/// [test_docs].
pub fn seeded_collection(database: &str, collection: &str) -> (Client, Collection) {
    let client = Client::new(None).expect("client");
    let coll = client
        .database(database)
        .collection(collection)
        .expect("collection");
    coll.insert_many(test_docs()).expect("seed documents");
    (client, coll)
}
