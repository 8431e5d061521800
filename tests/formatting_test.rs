//! Whole-dump formatting tests.

use pretty_assertions::assert_eq;
use schemafmt::config::Config;
use schemafmt::error::FormatError;
use schemafmt::formatter::Formatter;
use schemafmt::transforms::TransformKind;

const DUMP: &str = "
--
-- PostgreSQL database dump
--

SET statement_timeout = 0;
SET client_min_messages = warning;
SET default_with_oids = false;

COMMENT ON EXTENSION plpgsql IS 'PL/pgSQL procedural language';

CREATE TABLE public.posts (
    id bigint NOT NULL,
    title character varying,
    created_at timestamp(6) without time zone NOT NULL,
    user_id bigint
);

CREATE SEQUENCE public.posts_id_seq
    START WITH 1
    INCREMENT BY 1
    NO MINVALUE
    NO MAXVALUE
    CACHE 1;

ALTER SEQUENCE public.posts_id_seq OWNED BY public.posts.id;

CREATE TABLE public.users (
    id bigint NOT NULL,
    email text
);

ALTER TABLE ONLY public.posts ALTER COLUMN id SET DEFAULT nextval('public.posts_id_seq'::regclass);

ALTER TABLE ONLY public.posts
    ADD CONSTRAINT posts_pkey PRIMARY KEY (id);

ALTER TABLE ONLY public.users
    ADD CONSTRAINT users_pkey PRIMARY KEY (id);

CREATE INDEX index_posts_on_user_id ON public.posts USING btree (user_id);

CREATE UNIQUE INDEX index_users_on_email ON public.users USING btree (email);

ALTER TABLE ONLY public.posts
    ADD CONSTRAINT fk_rails_1 FOREIGN KEY (user_id) REFERENCES public.users(id);

INSERT INTO public.schema_migrations (version) VALUES
('2'),
('1');
";

const FORMATTED: &str = "SET client_min_messages TO warning;



-- Name: posts; Type: TABLE;

CREATE TABLE public.posts (
    id bigserial PRIMARY KEY,
    user_id bigint,
    title character varying,
    created_at timestamp(6) NOT NULL
);


CREATE INDEX index_posts_on_user_id ON public.posts USING btree (user_id);



-- Name: users; Type: TABLE;

CREATE TABLE public.users (
    id bigint PRIMARY KEY,
    email text
);


CREATE UNIQUE INDEX index_users_on_email ON public.users USING btree (email);


ALTER TABLE ONLY public.posts
  ADD CONSTRAINT fk_rails_1 FOREIGN KEY (user_id) REFERENCES public.users (id);



INSERT INTO public.schema_migrations (version) VALUES
  ('1')
, ('2')
;
";

fn format(sql: &str) -> String {
    Formatter::default().format(sql).unwrap()
}

fn format_with(kinds: &[TransformKind], sql: &str) -> String {
    let config = Config::builder().transforms(kinds.iter().copied()).build();
    Formatter::new(&config).format(sql).unwrap()
}

#[test]
fn test_full_dump() {
    assert_eq!(format(DUMP), FORMATTED);
}

#[test]
fn test_idempotent() {
    let once = format(DUMP);
    assert_eq!(format(&once), once);
    assert!(Formatter::default().is_formatted(&once).unwrap());
}

#[test]
fn test_idempotent_without_transforms() {
    let once = format_with(&[], DUMP);
    assert_eq!(format_with(&[], &once), once);
}

#[test]
fn test_primary_key_inlined() {
    let output = format(
        "CREATE TABLE t (id bigint NOT NULL);
         ALTER TABLE ONLY t ADD CONSTRAINT t_pkey PRIMARY KEY (id);",
    );
    assert_eq!(
        output,
        "-- Name: t; Type: TABLE;\n\nCREATE TABLE t (\n    id bigint PRIMARY KEY\n);\n"
    );
}

#[test]
fn test_default_settings_removed() {
    assert_eq!(format("SET default_with_oids = false;"), "");
    assert_eq!(
        format("SET default_with_oids = true;"),
        "SET default_with_oids TO TRUE;\n"
    );
}

#[test]
fn test_unique_index_first_after_table() {
    let output = format(
        "CREATE TABLE public.a (x integer, y integer);
         CREATE TABLE public.b (z integer);
         CREATE INDEX a_x ON public.a USING btree (x);
         CREATE UNIQUE INDEX a_y ON public.a USING btree (y);",
    );
    let table_a = output.find("CREATE TABLE public.a").unwrap();
    let unique = output.find("CREATE UNIQUE INDEX a_y").unwrap();
    let plain = output.find("CREATE INDEX a_x").unwrap();
    let table_b = output.find("CREATE TABLE public.b").unwrap();
    assert!(table_a < unique);
    assert!(unique < plain);
    assert!(plain < table_b);
    assert!(output.contains("(y);\n\nCREATE INDEX a_x"));
}

#[test]
fn test_migrations_sorted() {
    assert_eq!(
        format("INSERT INTO schema_migrations (version) VALUES ('2'),('1');"),
        "INSERT INTO schema_migrations (version) VALUES\n  ('1')\n, ('2')\n;\n"
    );
}

#[test]
fn test_or_conditions_aligned() {
    assert_eq!(
        format("CREATE VIEW public.v AS SELECT a FROM public.t WHERE a OR b OR c;"),
        "-- Name: v; Type: VIEW;\n\nCREATE VIEW public.v AS\n    SELECT a\n    FROM public.t\n    WHERE a\n       OR b\n       OR c;\n"
    );
}

#[test]
fn test_inlining_only_relocates() {
    let sql = "CREATE TABLE public.t (id bigint NOT NULL, n integer);
               ALTER TABLE ONLY public.t ADD CONSTRAINT t_n_check CHECK ((n > 0));";
    let output = format_with(&[TransformKind::InlineConstraints], sql);
    assert_eq!(
        output,
        "-- Name: t; Type: TABLE;\n\nCREATE TABLE public.t (\n    id bigint NOT NULL,\n    n integer,\n    CONSTRAINT t_n_check CHECK ((n > 0))\n);\n"
    );
}

#[test]
fn test_foreign_keys_opt_in() {
    let sql = "CREATE TABLE public.posts (id bigint NOT NULL, user_id bigint);
               ALTER TABLE ONLY public.posts ADD CONSTRAINT fk FOREIGN KEY (user_id) REFERENCES public.users(id);";
    assert!(format(sql).contains("ALTER TABLE ONLY public.posts"));

    let inlined = format_with(&[TransformKind::InlineForeignKeys], sql);
    assert!(!inlined.contains("ALTER TABLE"));
    assert!(inlined.contains("user_id bigint CONSTRAINT fk REFERENCES public.users (id)"));
}

#[test]
fn test_parse_error_reports_position() {
    let err = Formatter::default()
        .format("SET a = 1;\nSELECT 'oops")
        .unwrap_err();
    assert!(matches!(err, FormatError::Parse { .. }));
    assert!(err.position().is_some());
}

#[test]
fn test_empty_dump() {
    assert_eq!(format(""), "");
    assert_eq!(format("\n-- just comments\n"), "");
}
