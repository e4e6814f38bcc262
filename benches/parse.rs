use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rxtree::{
	parse, parse_with_options, to_xml_string, BuildOptions, DocumentRead, FeedParser,
	LexerOptions, PullParser,
};

const SHORT_DOC: &'static [u8] = b"<?xml version='1.0'?>\n<root xmlns='urn:uuid:fab98e86-7c09-477c-889c-0313d9877bb4' a=\"foo\" b='bar'><child>with some text</child></root>";

fn roster(items: usize) -> Vec<u8> {
	let mut doc = String::from("<iq xmlns='jabber:client' type='result' id='roster-1'><query xmlns='jabber:iq:roster' ver='ver7'>");
	for i in 0..items {
		doc.push_str(&format!(
			"<item jid='contact{0}@example.com' name='Contact &amp; Friend {0}' subscription='both'>\
			<group>Friends</group><group>Work</group></item>\n",
			i
		));
	}
	doc.push_str("</query></iq>");
	doc.into_bytes()
}

fn short_document(c: &mut Criterion) {
	c.bench_function("short_document", |bench| {
		bench.iter(|| {
			let mut doc = SHORT_DOC;
			let mut p = PullParser::new(black_box(&mut doc));
			p.read().unwrap().unwrap()
		});
	});
}

fn large_document(c: &mut Criterion) {
	let doc = roster(2000);
	let mut group = c.benchmark_group("large_document");

	group.bench_function("pull", |b| {
		b.iter(|| {
			let mut src = &doc[..];
			let mut p = PullParser::new(&mut src);
			p.read().unwrap().unwrap()
		});
	});

	group.bench_function("feed_chunked", |b| {
		b.iter(|| {
			let mut p = FeedParser::default();
			let mut root = None;
			for chunk in doc.chunks(1024) {
				p.feed(chunk.to_vec());
				if let Ok(Some(v)) = p.read() {
					root = Some(v);
				}
			}
			p.feed_eof();
			root.or_else(|| p.read().unwrap())
		});
	});

	group.bench_function("preserve_whitespace", |b| {
		let opts = BuildOptions::default().whitespace_preserve(true);
		b.iter(|| parse_with_options(black_box(&doc), LexerOptions::default(), opts).unwrap());
	});

	group.bench_function("serialize", |b| {
		let root = parse(&doc).unwrap();
		b.iter(|| to_xml_string(black_box(&root)));
	});

	group.finish();
}

criterion_group!(benches, short_document, large_document);
criterion_main!(benches);
