//! Tag tables, HTML5 name grammar, and entity decoding — spec §6's "must be
//! preserved bit-exactly for template compatibility" surface.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Tags whose content is never parsed as markup (spec §4.9's "plain-text
/// elements"); everything up to the matching end tag is a single text chunk.
pub fn is_plain_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea")
}

/// `script`/`style` additionally suppress CDATA/comment stripping inside
/// their plain-text run (spec §4.9: "CDATA and comment stripping applied
/// for non-script-like cases").
pub fn is_script_like(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Tags the compiler treats as built in and never resolves as user
/// components (spec §4.11's "not a built-in tag").
pub fn is_built_in_tag(tag: &str) -> bool {
    matches!(tag, "slot" | "component")
}

/// HTML5 tags reserved by the platform — never user component names (spec
/// §6's `isReservedTag`, spec §4.11's "is a platform-reserved tag").
pub fn is_reserved_tag(tag: &str) -> bool {
    is_html_tag(tag) || is_svg_tag(tag)
}

fn is_html_tag(tag: &str) -> bool {
    HTML_TAGS.contains(tag)
}

fn is_svg_tag(tag: &str) -> bool {
    SVG_TAGS.contains(tag)
}

static HTML_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    "html,body,base,head,link,meta,style,title,\
     address,article,aside,footer,header,hgroup,h1,h2,h3,h4,h5,h6,nav,section,\
     div,dd,dl,dt,figcaption,figure,picture,hr,img,li,main,ol,p,pre,ul,\
     a,b,abbr,bdi,bdo,br,cite,code,data,dfn,em,i,kbd,mark,q,rp,rt,rtc,ruby,\
     s,samp,small,span,strong,sub,sup,time,u,var,wbr,area,audio,map,track,video,\
     embed,object,param,source,canvas,script,noscript,del,ins,\
     caption,col,colgroup,table,thead,tbody,td,th,tr,\
     button,datalist,fieldset,form,input,label,legend,meter,optgroup,option,\
     output,progress,select,textarea,\
     details,dialog,menu,menuitem,summary,\
     content,element,shadow,template,blockquote,iframe,tfoot"
        .split(',')
        .collect()
});

static SVG_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    "svg,animate,circle,clippath,cursor,defs,desc,ellipse,filter,font-face,\
     foreignobject,g,glyph,image,line,marker,mask,missing-glyph,path,pattern,\
     polygon,polyline,rect,switch,symbol,text,textpath,tspan,use,view"
        .split(',')
        .collect()
});

/// Non-phrasing content tags, used by `expectHTML` auto-closing of a
/// left-open `<p>` (spec §4.9: "auto-closes paragraph before non-phrasing
/// tags").
pub fn is_non_phrasing_tag(tag: &str) -> bool {
    NON_PHRASING_TAGS.contains(tag)
}

static NON_PHRASING_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    "address,article,aside,base,blockquote,body,caption,col,colgroup,dd,\
     details,dialog,div,dl,dt,fieldset,figcaption,figure,footer,form,h1,h2,h3,\
     h4,h5,h6,head,header,hgroup,hr,html,legend,li,menuitem,meta,optgroup,\
     option,param,rp,rt,source,style,summary,tbody,td,tfoot,th,thead,title,tr,\
     track"
        .split(',')
        .collect()
});

/// Tags that may be left open when another start tag of the same name
/// begins — the repeated tag implicitly closes the previous one (spec
/// §4.9: "auto-closes repeated li/option-like left-open tags").
pub fn can_be_left_open_tag(tag: &str) -> bool {
    matches!(
        tag,
        "colgroup" | "dd" | "dt" | "li" | "options" | "p" | "td" | "tfoot" | "th" | "thead" | "tr" | "source"
    )
}

/// Unicode-aware component/attribute name grammar (spec §6: "the
/// Unicode-aware name regex"). A pragmatic ASCII-plus-XML-name-char subset:
/// first character a letter or `_`, remaining characters alphanumeric,
/// `-`, `_`, or `.`.
pub static QNAME_CHARS: &str = r"[a-zA-Z_][-a-zA-Z0-9_.]*(?::[a-zA-Z_][-a-zA-Z0-9_.]*)?";

/// Decodes `&lt; &gt; &quot; &amp; &#39;`, plus `&#10; &#9;` when
/// `decode_newlines` is requested (spec §4.9's decoding table).
pub fn decode_attribute(value: &str, decode_newlines: bool) -> String {
    let mut out = value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    if decode_newlines {
        out = out.replace("&#10;", "\n").replace("&#9;", "\t");
    }
    out
}
